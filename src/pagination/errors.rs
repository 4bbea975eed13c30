use std::time::Duration;
use thiserror::Error;

/// Failure of a collaborator call. Every variant is retryable by re-invoking the same entry point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Provider responded with status [{status}]: {message}")]
    Status {
        status: u16,
        message: String
    },
    #[error("Malformed response body: {0}")]
    MalformedBody(String),
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("Request was cancelled")]
    Cancelled
}
