use crate::error::WireError;

/// Size, in bytes, of the wire message header: length, request id, response-to, opcode.
pub const HEADER_LEN: usize = 16;

/// Legacy response opcode, used only to answer the initial handshake.
pub const OP_REPLY: i32 = 1;
/// Legacy request opcode, used only during the handshake.
pub const OP_QUERY: i32 = 2004;
/// Modern opcode carrying a flag word and one or more sections.
pub const OP_MSG: i32 = 2013;

/// A decoded header.
pub struct Header {
    /// Declared total message length, including the header itself.
    pub length: i32,
    /// Identifier assigned by the sender of this message.
    pub request_id: i32,
    /// For a response, the `request_id` of the message being answered.
    pub response_to: i32,
    /// One of [`OP_REPLY`], [`OP_QUERY`], [`OP_MSG`].
    pub opcode: i32,
}

/// Reads the 16-byte header at the start of `wm`. Fails if `wm` is too short or the declared
/// length overruns the buffer.
pub fn read_header(wm: &[u8]) -> Result<Header, WireError> {
    if wm.len() < HEADER_LEN {
        return Err(WireError::HeaderTooShort(HEADER_LEN));
    }
    let length = i32::from_le_bytes(wm[0..4].try_into().expect("4 bytes"));
    if length < HEADER_LEN as i32 || length as usize > wm.len() {
        return Err(WireError::LengthExceedsBuffer {
            declared: length.max(0) as usize,
            available: wm.len(),
        });
    }
    let request_id = i32::from_le_bytes(wm[4..8].try_into().expect("4 bytes"));
    let response_to = i32::from_le_bytes(wm[8..12].try_into().expect("4 bytes"));
    let opcode = i32::from_le_bytes(wm[12..16].try_into().expect("4 bytes"));
    Ok(Header {
        length,
        request_id,
        response_to,
        opcode,
    })
}

/// Appends a placeholder header (length `0`, to be patched by [`patch_length`]) to `buf`.
/// Returns the index at which the length placeholder begins.
pub fn append_header_start(buf: &mut Vec<u8>, request_id: i32, response_to: i32, opcode: i32) -> usize {
    let idx = buf.len();
    buf.extend_from_slice(&0i32.to_le_bytes());
    buf.extend_from_slice(&request_id.to_le_bytes());
    buf.extend_from_slice(&response_to.to_le_bytes());
    buf.extend_from_slice(&opcode.to_le_bytes());
    idx
}

/// Patches the length placeholder at `idx` with the number of bytes written to `buf` since.
pub fn patch_length(buf: &mut [u8], idx: usize) {
    let len = (buf.len() - idx) as i32;
    buf[idx..idx + 4].copy_from_slice(&len.to_le_bytes());
}
