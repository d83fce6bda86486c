//! Numbering error types.

use thiserror::Error;

/// Errors raised while validating a sequence template or configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceFormatError {
    /// Template is empty.
    #[error("Sequence format is empty")]
    Empty,

    /// Template exceeds the stored column width.
    #[error("Sequence format must be at most {0} characters")]
    TooLong(usize),

    /// A `{` without a matching `}`, or a stray `}`.
    #[error("Unbalanced braces in sequence format at position {0}")]
    UnbalancedBraces(usize),

    /// Placeholder is not one of the known tokens.
    #[error("Unknown token '{0}' in sequence format; allowed: prefix, year, yy, month, day, seq")]
    UnknownToken(String),

    /// Format spec is not allowed for this token.
    #[error("Unsupported format spec '{spec}' for token '{token}'")]
    InvalidSpec {
        /// Token name.
        token: String,
        /// Offending spec (text after the colon).
        spec: String,
    },

    /// Template never renders the counter.
    #[error("Sequence format must contain {{seq}}")]
    MissingSeq,

    /// Padding width outside the supported range.
    #[error("Sequence padding must be between 0 and {max}, got {value}")]
    InvalidPadding {
        /// Rejected padding.
        value: i32,
        /// Largest accepted padding.
        max: i32,
    },

    /// Prefix exceeds the stored column width.
    #[error("Sequence prefix must be at most {0} characters")]
    PrefixTooLong(usize),
}

impl SequenceFormatError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        "SEQUENCE_FORMAT_INVALID"
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        400
    }
}
