#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Decoding and encoding for the three wire message families the proxy understands.
//!
//! # Overview
//!
//! [`WireMessage`] is a closed tagged union over the legacy query opcode (decode-only, used by
//! the handshake), the modern message opcode (full round trip), and the legacy reply opcode
//! (used to encode the handshake's answer). [`decode`] dispatches on the header's opcode field;
//! each variant implements `encode_with`, which re-emits the message with its primary command
//! document replaced while leaving every other byte — including any document-sequence
//! sections on `OP_MSG` — untouched.
//!
//! # Design
//!
//! Decoding takes ownership of the message's bytes rather than borrowing them: the wire reader
//! hands over a buffer it will reuse for the next read, so each variant keeps its own copy and
//! records the primary document's location as a byte range within it. This sidesteps
//! self-referential lifetimes while still letting `encode_with` splice in a replacement with a
//! single allocation.
//!
//! # Example
//!
//! ```
//! use wire::ismaster::handshake_is_master_response;
//!
//! let reply = handshake_is_master_response(1);
//! let bytes = reply.encode();
//! assert!(!bytes.is_empty());
//! ```

mod error;
mod header;
pub mod ismaster;
mod msg;
mod query;
mod reply;

pub use error::WireError;
pub use header::{HEADER_LEN, OP_MSG, OP_QUERY, OP_REPLY};
pub use msg::OpMsg;
pub use query::OpQuery;
pub use reply::OpReply;

use header::read_header;

/// Helpers for hand-assembling raw wire messages in downstream crates' tests. Not part of the
/// proxy's runtime surface.
#[doc(hidden)]
pub mod test_support {
    pub use crate::header::{append_header_start, patch_length};
}

/// A decoded wire message: a query (handshake only), a message, or a reply.
pub enum WireMessage {
    /// Legacy `OP_QUERY`, decoded only during the handshake.
    Query(OpQuery),
    /// Modern `OP_MSG`, used for every proxied round trip.
    Msg(OpMsg),
    /// Legacy `OP_REPLY`, used to encode the handshake's answer.
    Reply(OpReply),
}

impl WireMessage {
    /// The embedded primary command document, regardless of which variant this is.
    pub fn command_document(&self) -> &[u8] {
        match self {
            Self::Query(q) => q.command_document(),
            Self::Msg(m) => m.command_document(),
            Self::Reply(r) => r.command_document(),
        }
    }

    /// The request id this message was sent with. `OP_REPLY` carries no request id of its own
    /// (it only answers one), so this returns `0` for that variant.
    pub fn request_id(&self) -> i32 {
        match self {
            Self::Query(q) => q.request_id(),
            Self::Msg(m) => m.request_id(),
            Self::Reply(_) => 0,
        }
    }

    /// Re-encodes this message verbatim. `OP_QUERY` has no encoder since it is only ever
    /// decoded (it appears solely as the client's handshake message), so this fails with
    /// [`WireError::QueryNotEncodable`] for that variant.
    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        match self {
            Self::Query(_) => Err(WireError::QueryNotEncodable),
            Self::Msg(m) => Ok(m.encode()),
            Self::Reply(r) => Ok(r.encode()),
        }
    }

    /// Re-encodes this message with its primary command document replaced by `replacement`.
    /// See [`WireMessage::encode`] for the `OP_QUERY` caveat.
    pub fn encode_with(&self, replacement: &[u8]) -> Result<Vec<u8>, WireError> {
        match self {
            Self::Query(_) => Err(WireError::QueryNotEncodable),
            Self::Msg(m) => Ok(m.encode_with(replacement)),
            Self::Reply(r) => Ok(r.encode_with(replacement)),
        }
    }
}

/// Decodes a complete wire message. `wm` may be longer than the declared length (a reused,
/// over-sized read buffer); only the declared prefix is interpreted.
pub fn decode(wm: &[u8]) -> Result<WireMessage, WireError> {
    let header = read_header(wm)?;
    let raw = wm[..header.length as usize].to_vec();

    match header.opcode {
        header::OP_QUERY => {
            let body = &raw[HEADER_LEN..];
            Ok(WireMessage::Query(query::decode_query(header.request_id, body)?))
        }
        header::OP_MSG => Ok(WireMessage::Msg(msg::decode_msg(&header, raw)?)),
        header::OP_REPLY => Ok(WireMessage::Reply(reply::decode_reply(&header, raw)?)),
        other => Err(WireError::UnrecognizedOpcode(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::builder::DocumentBuilder;
    use header::{append_header_start, patch_length};

    #[test]
    fn decode_dispatches_on_opcode() {
        let mut cmd = DocumentBuilder::new();
        cmd.append_string_element(b"$db", b"testdb");
        let cmd = cmd.finish();

        let mut raw = Vec::new();
        append_header_start(&mut raw, 3, 0, OP_MSG);
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw.push(0);
        raw.extend_from_slice(&cmd);
        patch_length(&mut raw, 0);

        let decoded = decode(&raw).unwrap();
        assert!(matches!(decoded, WireMessage::Msg(_)));
        assert_eq!(decoded.command_document(), cmd.as_slice());
    }

    #[test]
    fn unrecognized_opcode_is_rejected() {
        let mut raw = Vec::new();
        append_header_start(&mut raw, 1, 0, 9999);
        patch_length(&mut raw, 0);

        let err = decode(&raw).unwrap_err();
        assert!(matches!(err, WireError::UnrecognizedOpcode(9999)));
    }

    #[test]
    fn envelope_transparency_holds_for_msg() {
        let mut cmd = DocumentBuilder::new();
        cmd.append_int32_element(b"ping", 1);
        let cmd = cmd.finish();

        let mut raw = Vec::new();
        append_header_start(&mut raw, 1, 0, OP_MSG);
        raw.extend_from_slice(&0u32.to_le_bytes());
        raw.push(0);
        raw.extend_from_slice(&cmd);
        patch_length(&mut raw, 0);

        let decoded = decode(&raw).unwrap();
        let reencoded = decoded.encode_with(decoded.command_document()).unwrap();
        let redecoded = decode(&reencoded).unwrap();
        assert_eq!(redecoded.command_document(), decoded.command_document());
    }
}
