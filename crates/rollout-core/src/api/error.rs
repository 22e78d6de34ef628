//! Errors surfaced by backend operations.

/// Failure of a single backend operation.
///
/// `Display` yields the message shown to the operator. For non-2xx responses
/// that is exactly the plain-text body the backend returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Backend answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The request never produced a response.
    #[error("Request failed: {0}")]
    Transport(String),

    /// The response body was not the expected JSON.
    #[error("Invalid response: {0}")]
    Decode(String),

    /// A local file could not be read.
    #[error("{0}")]
    Io(String),

    /// The operation has no equivalent in the active data source.
    #[error("{0}")]
    Unsupported(String),
}

impl ApiError {
    /// Build a status error, substituting `fallback` for an empty body.
    pub fn status(status: u16, body: &str, fallback: &str) -> Self {
        let message = if body.trim().is_empty() {
            fallback.to_string()
        } else {
            body.to_string()
        };
        ApiError::Status { status, message }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}
