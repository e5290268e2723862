//! # Lint Errors
//!
//! Failures that prevent a report from being produced at all.
//!
//! Syntax errors and warnings are not errors here: they are the report.

use thiserror::Error;

/// Errors that can occur before or after analysis.
#[derive(Debug, Error)]
pub enum LintError {
    /// Source bytes are not UTF-8.
    #[error("source is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InvalidUtf8 {
        /// Length of the longest valid prefix.
        valid_up_to: usize,
    },

    /// The report could not be serialized or deserialized.
    #[error("report encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<std::str::Utf8Error> for LintError {
    fn from(error: std::str::Utf8Error) -> Self {
        Self::InvalidUtf8 { valid_up_to: error.valid_up_to() }
    }
}

// =============================================================================
// TESTS
// =============================================================================
