/*!
 * Error types for the alipay2ofx application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to the translation service
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The API refused the request because the quota is used up
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether the same request may succeed when sent again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }

    /// Whether every following request is bound to fail the same way
    pub fn is_fatal_for_session(&self) -> bool {
        matches!(self, Self::AuthenticationError(_) | Self::QuotaExceeded(_))
    }
}

/// Errors for a single statement record that could not be parsed
#[derive(Error, Debug, PartialEq)]
pub enum RecordError {
    /// The row has fewer cells than the export layout defines
    #[error("line {line}: expected at least {expected} fields, found {found}")]
    TooFewFields {
        line: u64,
        expected: usize,
        found: usize,
    },

    /// The amount cell is empty
    #[error("line {line}: missing amount")]
    MissingAmount { line: u64 },

    /// A decimal cell could not be parsed
    #[error("line {line}: invalid {field} '{value}'")]
    InvalidDecimal {
        line: u64,
        field: &'static str,
        value: String,
    },

    /// A timestamp cell could not be parsed
    #[error("line {line}: invalid {field} '{value}'")]
    InvalidTimestamp {
        line: u64,
        field: &'static str,
        value: String,
    },

    /// The row could not be split into cells
    #[error("line {line}: {message}")]
    Malformed { line: u64, message: String },
}

/// Structural problems found when re-reading an OFX file
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    /// The SGML header block is missing or wrong
    #[error("Invalid OFX header: {0}")]
    Header(String),

    /// A closing tag does not match the open aggregate
    #[error("Mismatched tag </{found}> (expected </{expected}>)")]
    MismatchedTag { expected: String, found: String },

    /// A closing tag appeared with nothing open
    #[error("Unexpected closing tag </{0}>")]
    UnexpectedClose(String),

    /// End of input with aggregates still open
    #[error("Unclosed tag <{0}>")]
    Unclosed(String),

    /// A required aggregate or element is absent
    #[error("Missing required element <{0}>")]
    Missing(String),

    /// An element carries a value that cannot be read
    #[error("Invalid value for <{tag}>: '{value}'")]
    InvalidValue { tag: String, value: String },
}
