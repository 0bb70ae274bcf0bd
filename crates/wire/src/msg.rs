use std::ops::Range;

use crate::error::WireError;
use crate::header::{append_header_start, patch_length, Header, HEADER_LEN, OP_MSG};

const SECTION_SINGLE_DOCUMENT: u8 = 0;
const SECTION_DOCUMENT_SEQUENCE: u8 = 1;

fn malformed(reason: impl Into<String>) -> WireError {
    WireError::MalformedBody {
        opcode: "OP_MSG",
        reason: reason.into(),
    }
}

/// A modern `OP_MSG` message: a flag word followed by one or more sections. Exactly one
/// `SingleDocument` section carries the primary command document; any `DocumentSequence`
/// sections (bulk write batches and the like) are preserved byte-for-byte and are not otherwise
/// inspected.
///
/// Holds the full original encoding in `raw` plus the byte range of the primary document within
/// it, so [`OpMsg::encode_with`] can splice in a replacement without re-walking the section
/// list.
pub struct OpMsg {
    raw: Vec<u8>,
    request_id: i32,
    response_to: i32,
    command_range: Range<usize>,
}

impl OpMsg {
    /// The request identifier carried in the header.
    pub fn request_id(&self) -> i32 {
        self.request_id
    }

    /// The `response_to` field carried in the header.
    pub fn response_to(&self) -> i32 {
        self.response_to
    }

    /// The primary command document's raw bytes.
    pub fn command_document(&self) -> &[u8] {
        &self.raw[self.command_range.clone()]
    }

    /// Re-encodes this message, verbatim.
    pub fn encode(&self) -> Vec<u8> {
        self.raw.clone()
    }

    /// Re-encodes this message with the primary command document replaced by `replacement`.
    /// Every other byte — header fields, flags, and any document-sequence sections — is
    /// emitted unchanged.
    pub fn encode_with(&self, replacement: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.raw.len() - self.command_range.len() + replacement.len());
        out.extend_from_slice(&self.raw[..self.command_range.start]);
        out.extend_from_slice(replacement);
        out.extend_from_slice(&self.raw[self.command_range.end..]);
        patch_length(&mut out, 0);
        out
    }

    /// Builds a freshly constructed single-section response, using `response_to` as the
    /// header's response-to field and `request_id` left at `0` (this proxy never originates
    /// its own request ids; it only answers them).
    pub fn new_response(response_to: i32, command: &[u8]) -> Self {
        let mut raw = Vec::with_capacity(HEADER_LEN + 4 + 1 + command.len());
        append_header_start(&mut raw, 0, response_to, OP_MSG);
        raw.extend_from_slice(&0u32.to_le_bytes()); // flag bits
        raw.push(SECTION_SINGLE_DOCUMENT);
        let command_start = raw.len();
        raw.extend_from_slice(command);
        let command_range = command_start..raw.len();
        patch_length(&mut raw, 0);
        Self {
            raw,
            request_id: 0,
            response_to,
            command_range,
        }
    }
}

/// Decodes an `OP_MSG` message. `raw` must be the complete message, including its 16-byte
/// header, truncated to exactly `header.length` bytes.
pub fn decode_msg(header: &Header, raw: Vec<u8>) -> Result<OpMsg, WireError> {
    let body = &raw[HEADER_LEN..];
    if body.len() < 4 {
        return Err(malformed("missing flag bits"));
    }
    let mut offset = HEADER_LEN + 4;
    let mut command_range = None;

    while offset < raw.len() {
        let section_type = raw[offset];
        offset += 1;

        match section_type {
            SECTION_SINGLE_DOCUMENT => {
                let doc_len = read_doc_len(&raw, offset)?;
                let range = offset..offset + doc_len;
                if command_range.is_none() {
                    command_range = Some(range.clone());
                }
                offset = range.end;
            }
            SECTION_DOCUMENT_SEQUENCE => {
                let seq_len = read_doc_len(&raw, offset)?;
                offset += seq_len;
            }
            other => return Err(malformed(format!("unknown section type {other}"))),
        }
    }

    let command_range = command_range.ok_or(WireError::MissingPrimarySection)?;
    Ok(OpMsg {
        request_id: header.request_id,
        response_to: header.response_to,
        raw,
        command_range,
    })
}

fn read_doc_len(raw: &[u8], offset: usize) -> Result<usize, WireError> {
    let bytes = raw.get(offset..offset + 4).ok_or_else(|| malformed("truncated section length"))?;
    let len = i32::from_le_bytes(bytes.try_into().expect("4 bytes"));
    if len < 5 || offset + len as usize > raw.len() {
        return Err(malformed("section length overruns message"));
    }
    Ok(len as usize)
}
