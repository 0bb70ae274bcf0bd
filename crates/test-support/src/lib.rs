#![deny(unsafe_code)]

//! Small, allocation-friendly BSON-document and wire-message builders shared by every crate's
//! test suite.
//!
//! None of this is part of the proxy's runtime surface; it exists only so individual crates'
//! tests don't each reinvent "build a one-field command document" or "wrap a command document
//! as an `OP_MSG`".

use bson::builder::DocumentBuilder;
use wire::OpMsg;

/// A single field to append to a document built by [`command_doc`] / [`nested_doc`].
pub enum Field<'a> {
    /// A UTF-8 string field.
    Str(&'a str, &'a str),
    /// A 32-bit integer field.
    I32(&'a str, i32),
    /// A 64-bit integer field.
    I64(&'a str, i64),
    /// A boolean field.
    Bool(&'a str, bool),
    /// A subdocument field, already encoded by a nested [`command_doc`] call.
    Doc(&'a str, Vec<u8>),
    /// An array field, already encoded (see [`array_of`]).
    Arr(&'a str, Vec<u8>),
}

/// Builds a complete, length-prefixed document from an ordered list of fields.
pub fn command_doc(fields: &[Field<'_>]) -> Vec<u8> {
    let mut builder = DocumentBuilder::new();
    for field in fields {
        match field {
            Field::Str(k, v) => builder.append_string_element(k.as_bytes(), v.as_bytes()),
            Field::I32(k, v) => builder.append_int32_element(k.as_bytes(), *v),
            Field::I64(k, v) => builder.append_int64_element(k.as_bytes(), *v),
            Field::Bool(k, v) => builder.append_boolean_element(k.as_bytes(), *v),
            Field::Doc(k, v) => builder.append_document_element(k.as_bytes(), v),
            Field::Arr(k, v) => builder.append_array_element(k.as_bytes(), v),
        }
    }
    builder.finish()
}

/// Builds a length-prefixed array document from an ordered list of already-encoded elements,
/// keying each one by its stringified index (`"0"`, `"1"`, ...).
pub fn array_of(elements: &[Vec<u8>]) -> Vec<u8> {
    let mut builder = DocumentBuilder::new();
    let mut scratch = String::new();
    for (index, element) in elements.iter().enumerate() {
        let key = bson::builder::array_index_key(index, &mut scratch).to_vec();
        builder.append_document_element(&key, element);
    }
    builder.finish()
}

/// Wraps `command` as a minimal single-section `OP_MSG`. Uses [`wire::test_support`] directly
/// (rather than [`OpMsg::new_response`]) so the decoded message's `request_id()` is `tag`, not
/// `0` — tests that assert on request/response-to propagation need the real field, which
/// `new_response` deliberately leaves at `0` since it only ever builds replies.
pub fn msg_with_command(tag: i32, command: &[u8]) -> OpMsg {
    use wire::test_support::{append_header_start, patch_length};

    let mut raw = Vec::new();
    append_header_start(&mut raw, tag, 0, wire::OP_MSG);
    raw.extend_from_slice(&0u32.to_le_bytes());
    raw.push(0); // section type: single document
    raw.extend_from_slice(command);
    patch_length(&mut raw, 0);

    match wire::decode(&raw).expect("just-built OP_MSG decodes") {
        wire::WireMessage::Msg(msg) => msg,
        _ => unreachable!("decode() of an OP_MSG always yields WireMessage::Msg"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_doc_round_trips_through_doc_iterator() {
        let doc = command_doc(&[Field::Str("$db", "testdb"), Field::I32("ping", 1)]);
        let mut iter = bson::DocIterator::new(&doc).unwrap();
        assert!(iter.next());
        assert_eq!(iter.element().unwrap().key(), b"$db");
        assert!(iter.next());
        assert_eq!(iter.element().unwrap().key(), b"ping");
        assert!(!iter.next());
        assert!(iter.err().is_none());
    }

    #[test]
    fn msg_with_command_exposes_the_same_document() {
        let cmd = command_doc(&[Field::Str("find", "c")]);
        let msg = msg_with_command(11, &cmd);
        assert_eq!(msg.command_document(), cmd.as_slice());
    }
}
