use bson::DocIterator;

use crate::error::WireError;
use crate::header::HEADER_LEN;

/// A legacy `OP_QUERY` message. Only decoded, never encoded: this opcode appears solely as the
/// client's first message during the handshake.
pub struct OpQuery {
    request_id: i32,
    db_name: String,
    collection_name: String,
    query: Vec<u8>,
}

impl OpQuery {
    /// The request identifier assigned by the client.
    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    /// The database name parsed out of the full collection name (`"<db>.<coll>"`).
    pub fn db_name(&self) -> &str {
        &self.db_name
    }

    /// The collection name parsed out of the full collection name.
    pub fn collection_name(&self) -> &str {
        &self.collection_name
    }

    /// The embedded command document.
    pub fn command_document(&self) -> &[u8] {
        &self.query
    }
}

fn malformed(reason: impl Into<String>) -> WireError {
    WireError::MalformedBody {
        opcode: "OP_QUERY",
        reason: reason.into(),
    }
}

fn read_cstring(buf: &[u8]) -> Result<(&str, &[u8]), WireError> {
    let nul = buf.iter().position(|&b| b == 0).ok_or_else(|| malformed("unterminated collection name"))?;
    let s = std::str::from_utf8(&buf[..nul]).map_err(|_| malformed("collection name is not valid utf-8"))?;
    Ok((s, &buf[nul + 1..]))
}

fn read_i32(buf: &[u8]) -> Result<(i32, &[u8]), WireError> {
    if buf.len() < 4 {
        return Err(malformed("truncated int32 field"));
    }
    let (head, rest) = buf.split_at(4);
    Ok((i32::from_le_bytes(head.try_into().expect("4 bytes")), rest))
}

fn read_document(buf: &[u8]) -> Result<(&[u8], &[u8]), WireError> {
    let (len, _) = read_i32(buf)?;
    if len < 5 || len as usize > buf.len() {
        return Err(malformed("truncated document"));
    }
    Ok(buf.split_at(len as usize))
}

/// Decodes an `OP_QUERY` body (everything after the 16-byte header).
pub fn decode_query(request_id: i32, body: &[u8]) -> Result<OpQuery, WireError> {
    let (_flags, rest) = read_i32(body)?;
    let (full_collection_name, rest) = read_cstring(rest)?;
    let (db_name, collection_name) = match full_collection_name.split_once('.') {
        Some((db, coll)) => (db.to_string(), coll.to_string()),
        None => (String::new(), full_collection_name.to_string()),
    };
    let (_number_to_skip, rest) = read_i32(rest)?;
    let (_number_to_return, rest) = read_i32(rest)?;
    let (query, _rest) = read_document(rest)?;

    // Validate the document decodes cleanly before handing it to callers.
    let mut iter = DocIterator::new(query)?;
    while iter.next() {}
    if let Some(err) = iter.err() {
        return Err(malformed(format!("invalid command document: {err}")));
    }

    Ok(OpQuery {
        request_id,
        db_name,
        collection_name,
        query: query.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_wire_bytes(full_collection_name: &str, query_doc: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&0i32.to_le_bytes()); // flags
        body.extend_from_slice(full_collection_name.as_bytes());
        body.push(0);
        body.extend_from_slice(&0i32.to_le_bytes()); // numberToSkip
        body.extend_from_slice(&1i32.to_le_bytes()); // numberToReturn
        body.extend_from_slice(query_doc);
        body
    }

    #[test]
    fn splits_db_and_collection() {
        let mut doc = bson::builder::DocumentBuilder::new();
        doc.append_int32_element(b"isMaster", 1);
        let doc = doc.finish();

        let body = build_wire_bytes("admin.$cmd", &doc);
        let query = decode_query(7, &body).unwrap();
        assert_eq!(query.db_name(), "admin");
        assert_eq!(query.collection_name(), "$cmd");
        assert_eq!(query.request_id(), 7);
    }

    #[test]
    fn header_len_constant_matches_spec() {
        assert_eq!(HEADER_LEN, 16);
    }
}
