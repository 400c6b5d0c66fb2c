//! # Error Types
//!
//! Validation errors for the domain primitive newtypes, built with
//! `thiserror`. Each variant carries the rejected input so that a caller
//! can report it without re-parsing.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Resource identifier below the smallest assignable id.
    #[error("invalid resource id: {value} (expected an integer >= {minimum})")]
    ResourceIdOutOfRange {
        /// The rejected value.
        value: u64,
        /// Smallest accepted value.
        minimum: u64,
    },

    /// String is not an absolute URL.
    #[error("invalid url: \"{value}\" ({reason})")]
    InvalidUrl {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Timestamp string is not valid ISO 8601 / RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
