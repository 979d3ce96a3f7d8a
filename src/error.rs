//! Error types for clickhouse-link.
//!
//! The only failure this crate defines itself is a non-success HTTP status
//! (plus the empty-result materialisation case). Transport and Arrow faults
//! pass through unchanged.

use arrow::error::ArrowError;
use thiserror::Error;

/// Result type for clickhouse-link operations
pub type Result<T> = std::result::Result<T, ClickHouseLinkError>;

/// Errors that can occur while talking to ClickHouse
#[derive(Error, Debug)]
pub enum ClickHouseLinkError {
    /// The server answered with a status other than 200.
    ///
    /// `body` is the raw response text and usually carries the server's
    /// exception message.
    #[error("Unexpected HTTP response status code: {status_code}.")]
    ServerError { status_code: u16, body: String },

    /// A table was requested from a query that produced no batches and no
    /// schema was supplied to type the empty result.
    #[error("Cannot infer a schema from an empty result; supply a schema to read an empty table")]
    EmptyResultWithoutSchema,

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error(transparent)]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClickHouseLinkError {
    /// HTTP status code for server errors
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::ServerError { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Raw response body for server errors
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::ServerError { body, .. } => Some(body.as_str()),
            _ => None,
        }
    }
}
