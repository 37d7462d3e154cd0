//! Error types for batching client operations

use thiserror::Error;

/// Result type for batching client operations
pub type BatchClientResult<T> = Result<T, BatchClientError>;

/// Top-level error type for batching client operations
#[derive(Error, Debug)]
pub enum BatchClientError {
    /// Invalid endpoint URL or option value
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A collected payload could not be decoded into responses
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// A single-request call came back with no responses
    #[error("Batch returned no responses for a single request")]
    EmptyResult,

    /// The dispatch cycle was cancelled before it completed
    #[error("Dispatch cycle cancelled")]
    Cancelled,

    /// A worker or collector task failed
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration errors, surfaced when the client or an option is set
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("{option} must be a positive integer")]
    NonPositive { option: &'static str },

    #[error("Failed to create HTTP client: {0}")]
    HttpClient(String),
}

/// Transport-specific errors for one batch exchange
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP transport error: {0}")]
    Http(String),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Failed to encode batch: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors from turning collected payloads into responses
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The payload was not a JSON array of responses
    #[error("{source}\n{payload}")]
    Malformed {
        source: serde_json::Error,
        payload: String,
    },

    /// The batch never produced a body because its exchange failed
    #[error("batch exchange failed: {message}")]
    TransportFailed { message: String },
}

impl DecodeError {
    /// The text that could not be decoded: the raw payload, or the transport failure message
    pub fn payload_text(&self) -> &str {
        match self {
            Self::Malformed { payload, .. } => payload,
            Self::TransportFailed { message } => message,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Body(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl BatchClientError {
    /// Create an internal error with a message
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if the error came from structured decoding
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Check if the error came from configuration
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// The offending payload text for decode errors
    pub fn raw_payload(&self) -> Option<&str> {
        match self {
            Self::Decode(err) => Some(err.payload_text()),
            _ => None,
        }
    }
}
