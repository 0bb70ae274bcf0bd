use std::ops::Range;

use crate::error::WireError;
use crate::header::{append_header_start, patch_length, Header, HEADER_LEN, OP_REPLY};

fn malformed(reason: impl Into<String>) -> WireError {
    WireError::MalformedBody {
        opcode: "OP_REPLY",
        reason: reason.into(),
    }
}

/// A legacy `OP_REPLY` message, used only to answer the connection handshake.
pub struct OpReply {
    raw: Vec<u8>,
    response_to: i32,
    command_range: Range<usize>,
}

impl OpReply {
    /// The `response_to` field carried in the header.
    pub fn response_to(&self) -> i32 {
        self.response_to
    }

    /// The reply's single document.
    pub fn command_document(&self) -> &[u8] {
        &self.raw[self.command_range.clone()]
    }

    /// Re-encodes this message, verbatim.
    pub fn encode(&self) -> Vec<u8> {
        self.raw.clone()
    }

    /// Re-encodes this message with its document replaced by `replacement`.
    pub fn encode_with(&self, replacement: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.raw.len() - self.command_range.len() + replacement.len());
        out.extend_from_slice(&self.raw[..self.command_range.start]);
        out.extend_from_slice(replacement);
        out.extend_from_slice(&self.raw[self.command_range.end..]);
        patch_length(&mut out, 0);
        out
    }

    /// Builds the canned handshake response: flags `0`, cursor id `0`, starting-from `0`,
    /// number-returned `1`, carrying `document`.
    pub fn new_response(response_to: i32, document: &[u8]) -> Self {
        let mut raw = Vec::with_capacity(HEADER_LEN + 20 + document.len());
        append_header_start(&mut raw, 0, response_to, OP_REPLY);
        raw.extend_from_slice(&0i32.to_le_bytes()); // response flags
        raw.extend_from_slice(&0i64.to_le_bytes()); // cursor id
        raw.extend_from_slice(&0i32.to_le_bytes()); // starting from
        raw.extend_from_slice(&1i32.to_le_bytes()); // number returned
        let command_start = raw.len();
        raw.extend_from_slice(document);
        let command_range = command_start..raw.len();
        patch_length(&mut raw, 0);
        Self {
            raw,
            response_to,
            command_range,
        }
    }
}

/// Decodes an `OP_REPLY` message. Fails unless the reply carries exactly one document.
pub fn decode_reply(header: &Header, raw: Vec<u8>) -> Result<OpReply, WireError> {
    let body = &raw[HEADER_LEN..];
    if body.len() < 20 {
        return Err(malformed("truncated reply header fields"));
    }
    let number_returned = i32::from_le_bytes(body[16..20].try_into().expect("4 bytes"));
    if number_returned != 1 {
        return Err(WireError::UnexpectedReplyDocumentCount(number_returned.max(0) as usize));
    }

    let doc_start = HEADER_LEN + 20;
    let doc_len_bytes = raw.get(doc_start..doc_start + 4).ok_or_else(|| malformed("missing document"))?;
    let doc_len = i32::from_le_bytes(doc_len_bytes.try_into().expect("4 bytes"));
    if doc_len < 5 || doc_start + doc_len as usize != raw.len() {
        return Err(malformed("document length does not account for all remaining bytes"));
    }
    let command_range = doc_start..raw.len();

    Ok(OpReply {
        response_to: header.response_to,
        raw,
        command_range,
    })
}
