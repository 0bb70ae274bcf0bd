use crate::error::BsonError;
use crate::value::{Element, ElementType, Value};

fn read_i32(buf: &[u8], offset: usize) -> Result<i32, BsonError> {
    let bytes = buf.get(offset..offset + 4).ok_or(BsonError::TruncatedElement {
        element_type: 0,
        offset,
        declared: 4,
        available: buf.len().saturating_sub(offset),
    })?;
    Ok(i32::from_le_bytes(bytes.try_into().expect("slice of len 4")))
}

fn read_i64(buf: &[u8], offset: usize) -> Result<i64, BsonError> {
    let bytes = buf.get(offset..offset + 8).ok_or(BsonError::TruncatedElement {
        element_type: 0,
        offset,
        declared: 8,
        available: buf.len().saturating_sub(offset),
    })?;
    Ok(i64::from_le_bytes(bytes.try_into().expect("slice of len 8")))
}

fn read_f64(buf: &[u8], offset: usize) -> Result<f64, BsonError> {
    let bytes = buf.get(offset..offset + 8).ok_or(BsonError::TruncatedElement {
        element_type: 0,
        offset,
        declared: 8,
        available: buf.len().saturating_sub(offset),
    })?;
    Ok(f64::from_le_bytes(bytes.try_into().expect("slice of len 8")))
}

/// Scans a nul-terminated byte string starting at `offset`. Returns the bytes excluding the
/// terminator and the offset immediately after it.
fn read_cstring(buf: &[u8], offset: usize) -> Result<(&[u8], usize), BsonError> {
    let rest = buf.get(offset..).ok_or(BsonError::UnterminatedCString(offset))?;
    let nul = rest.iter().position(|&b| b == 0).ok_or(BsonError::UnterminatedCString(offset))?;
    Ok((&rest[..nul], offset + nul + 1))
}

/// Length, in bytes, of a type's payload starting at `offset` in `buf` (not including the type
/// tag or key that precede it). For self-length-prefixed types (string, document, array,
/// javascript-with-scope) this reads the length field out of `buf`; for fixed-size and
/// variable-terminated types it is computed directly.
fn payload_len(element_type: ElementType, buf: &[u8], offset: usize) -> Result<usize, BsonError> {
    use ElementType::{
        Array, Binary, Boolean, DateTime, DbPointer, Decimal128, Document, Double, Int32, Int64,
        JavaScript, JavaScriptWithScope, MaxKey, MinKey, Null, ObjectId, Regex, Symbol, Timestamp,
        Undefined,
    };
    Ok(match element_type {
        Double => 8,
        Boolean => 1,
        DateTime | Int64 | Timestamp => 8,
        Int32 => 4,
        Decimal128 => 16,
        ObjectId => 12,
        Null | Undefined | MinKey | MaxKey => 0,
        ElementType::String | JavaScript | Symbol => {
            let strlen = read_i32(buf, offset)?;
            if strlen < 1 {
                return Err(BsonError::InvalidStringLength(offset));
            }
            4 + strlen as usize
        }
        Document | Array => {
            let declared = read_i32(buf, offset)?;
            if declared < 5 {
                return Err(BsonError::InvalidStringLength(offset));
            }
            declared as usize
        }
        Binary => {
            let declared = read_i32(buf, offset)?;
            if declared < 0 {
                return Err(BsonError::InvalidStringLength(offset));
            }
            4 + 1 + declared as usize
        }
        JavaScriptWithScope => {
            let declared = read_i32(buf, offset)?;
            if declared < 4 {
                return Err(BsonError::InvalidStringLength(offset));
            }
            declared as usize
        }
        DbPointer => {
            let strlen = read_i32(buf, offset)?;
            if strlen < 1 {
                return Err(BsonError::InvalidStringLength(offset));
            }
            4 + strlen as usize + 12
        }
        Regex => {
            let (_, after_pattern) = read_cstring(buf, offset)?;
            let (_, after_options) = read_cstring(buf, after_pattern)?;
            after_options - offset
        }
    })
}

fn decode_value<'a>(
    element_type: ElementType,
    buf: &'a [u8],
    offset: usize,
    len: usize,
) -> Result<Value<'a>, BsonError> {
    let payload = &buf[offset..offset + len];
    Ok(match element_type {
        ElementType::Double => Value::Double(read_f64(buf, offset)?),
        ElementType::Boolean => Value::Boolean(payload[0] != 0),
        ElementType::DateTime => Value::DateTime(read_i64(buf, offset)?),
        ElementType::Int32 => Value::Int32(read_i32(buf, offset)?),
        ElementType::Int64 => Value::Int64(read_i64(buf, offset)?),
        ElementType::Timestamp => Value::Timestamp(u64::from_le_bytes(
            payload.try_into().expect("8-byte timestamp payload"),
        )),
        ElementType::Null | ElementType::Undefined | ElementType::MinKey | ElementType::MaxKey => {
            Value::Null
        }
        ElementType::String | ElementType::JavaScript | ElementType::Symbol => {
            // payload = int32 length (includes trailing nul) + bytes + nul
            Value::String(&payload[4..len - 1])
        }
        ElementType::Document => Value::Document(payload),
        ElementType::Array => Value::Array(payload),
        ElementType::Binary => Value::Binary {
            subtype: payload[4],
            data: &payload[5..],
        },
        ElementType::ObjectId => {
            let mut oid = [0u8; 12];
            oid.copy_from_slice(payload);
            Value::ObjectId(oid)
        }
        other => Value::Opaque {
            element_type: other,
            raw: payload,
        },
    })
}

/// Reads one `(type, key, value)` element starting at the beginning of `src`. Returns the
/// decoded element alongside the number of bytes it consumed.
pub(crate) fn read_element(src: &[u8]) -> Result<(Element<'_>, usize), BsonError> {
    let tag = *src.first().ok_or(BsonError::UnterminatedCString(0))?;
    let element_type = ElementType::from_tag(tag)?;
    let (key, payload_start) = read_cstring(src, 1)?;
    let len = payload_len(element_type, src, payload_start).map_err(|e| match e {
        BsonError::TruncatedElement { offset, declared, available, .. } => {
            BsonError::TruncatedElement { element_type: tag, offset, declared, available }
        }
        other => other,
    })?;
    let end = payload_start.checked_add(len).ok_or(BsonError::TruncatedElement {
        element_type: tag,
        offset: payload_start,
        declared: len,
        available: src.len().saturating_sub(payload_start),
    })?;
    if end > src.len() {
        return Err(BsonError::TruncatedElement {
            element_type: tag,
            offset: payload_start,
            declared: len,
            available: src.len() - payload_start,
        });
    }
    let value = decode_value(element_type, src, payload_start, len)?;
    let element = Element {
        key,
        value,
        raw: &src[..end],
    };
    Ok((element, end))
}
