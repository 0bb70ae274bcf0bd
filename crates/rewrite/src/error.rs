use bson::BsonError;
use thiserror::Error;

/// Errors raised while walking a document through a rewriter tree.
#[derive(Debug, Error)]
pub enum FixError {
    /// The document being rewritten failed to decode.
    #[error(transparent)]
    Bson(#[from] BsonError),

    /// A [`crate::DocumentFixer`] matched a key whose value was not a subdocument.
    #[error("expected value for key \"{key}\" to be document, got {actual}")]
    ExpectedDocument {
        /// The key whose value had the wrong type.
        key: String,
        /// A human-readable name for the value's actual type.
        actual: &'static str,
    },

    /// A [`crate::ArrayFixer`] matched a key whose value was not an array.
    #[error("expected value for key \"{key}\" to be array, got {actual}")]
    ExpectedArray {
        /// The key whose value had the wrong type.
        key: String,
        /// A human-readable name for the value's actual type.
        actual: &'static str,
    },

    /// A leaf fixer expected a string value and got something else.
    #[error("expected value for key \"{key}\" to be string, got {actual}")]
    ExpectedString {
        /// The key whose value had the wrong type.
        key: String,
        /// A human-readable name for the value's actual type.
        actual: &'static str,
    },
}
