use thiserror::Error;

/// Errors raised while decoding a wire message envelope.
#[derive(Debug, Error)]
pub enum WireError {
    /// The buffer is shorter than the 16-byte header.
    #[error("wire message shorter than the {0}-byte header")]
    HeaderTooShort(usize),

    /// The header's declared message length exceeds the buffer actually available.
    #[error("declared message length {declared} exceeds available {available} bytes")]
    LengthExceedsBuffer { declared: usize, available: usize },

    /// The opcode field did not match any supported message family.
    #[error("unrecognized opcode {0}")]
    UnrecognizedOpcode(i32),

    /// A field within the message body could not be decoded (truncated or malformed).
    #[error("malformed {opcode} body: {reason}")]
    MalformedBody {
        /// Name of the opcode being decoded (`"OP_QUERY"`, `"OP_MSG"`, `"OP_REPLY"`).
        opcode: &'static str,
        /// What went wrong.
        reason: String,
    },

    /// An `OP_MSG` had no `SingleDocument` section, so there is no primary command document.
    #[error("OP_MSG contained no primary document section")]
    MissingPrimarySection,

    /// An `OP_REPLY` carried a number of documents other than exactly one.
    #[error("OP_REPLY carried {0} documents, expected exactly 1")]
    UnexpectedReplyDocumentCount(usize),

    /// `OP_QUERY` is decode-only: it appears only as the client's handshake message and the
    /// proxy never re-encodes one.
    #[error("OP_QUERY cannot be re-encoded; it is decode-only")]
    QueryNotEncodable,
}
