use thiserror::Error;

/// Errors raised while reading or validating the binary document format.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BsonError {
    /// The buffer is shorter than the minimum legal document size (4-byte length + terminator).
    #[error("document must be at least {min} bytes, got {actual}")]
    DocumentTooSmall {
        /// Minimum legal document size in bytes.
        min: usize,
        /// Size of the buffer that was rejected.
        actual: usize,
    },

    /// An element's declared payload length runs past the end of the buffer.
    #[error("element of type 0x{element_type:02x} at offset {offset} declares {declared} bytes but only {available} remain")]
    TruncatedElement {
        /// Raw BSON type tag of the offending element.
        element_type: u8,
        /// Byte offset of the element within its document.
        offset: usize,
        /// Declared payload length.
        declared: usize,
        /// Bytes actually remaining in the buffer.
        available: usize,
    },

    /// The element's type tag does not match any known document-format type.
    #[error("unrecognized element type 0x{0:02x}")]
    UnknownElementType(u8),

    /// A key (or, for regex elements, a pattern/options pair) was not terminated by a nul byte.
    #[error("unterminated key or string at offset {0}")]
    UnterminatedCString(usize),

    /// A string-typed payload's declared length does not include a trailing nul, or is zero.
    #[error("invalid string length at offset {0}")]
    InvalidStringLength(usize),

    /// A value accessor (`as_document`, `as_array`, `as_str`, ...) was called against a value
    /// of a different runtime type.
    #[error("expected {expected} value, got {actual}")]
    TypeMismatch {
        /// The type the caller required.
        expected: &'static str,
        /// A human-readable name for the value's actual type.
        actual: &'static str,
    },
}
