//! Error types for the marketplace API client.
//!
//! # Design
//! Every non-2xx response lands in `Http` with the raw status and body; the
//! client does not special-case individual codes. Pages that want the
//! backend's human-readable reason call [`ApiError::server_message`], which
//! reads the `message` field of a JSON error body.

use thiserror::Error;

/// Errors returned by the HTTP client wrapper and the service layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (connection refused, DNS, broken pipe).
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a status outside 2xx.
    #[error("HTTP error! status: {status}")]
    Http { status: u16, body: String },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A paged envelope violated its size or page-index invariant.
    #[error("malformed page: {0}")]
    MalformedPage(String),
}

impl ApiError {
    /// HTTP status, when the failure came from a received response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The `message` field of a JSON error body, if the backend sent one.
    pub fn server_message(&self) -> Option<String> {
        let ApiError::Http { body, .. } = self else {
            return None;
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Deserialization(err.to_string())
    }
}
