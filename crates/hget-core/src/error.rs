//! Error types for fetching and decoding.

use std::io;

use thiserror::Error;

/// Result type alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors that can occur while resolving, exchanging, or decoding.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("malformed url: {0}")]
    MalformedUrl(String),

    #[error("unsupported scheme: {0} (only http is supported)")]
    UnsupportedScheme(String),

    #[error("connection to {target} failed: {source}")]
    Connection {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("server did not answer 200: {status_line}")]
    NoSuccessStatus { status_line: String },

    #[error("malformed chunk encoding: {0}")]
    MalformedChunkEncoding(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl FetchError {
    pub(crate) fn connection(target: impl ToString, source: io::Error) -> Self {
        Self::Connection {
            target: target.to_string(),
            source,
        }
    }

    /// Whether this is the non-200 outcome rather than a transport or protocol fault.
    pub fn is_no_success(&self) -> bool {
        matches!(self, FetchError::NoSuccessStatus { .. })
    }
}
