//! Error types for the capture board engine

use thiserror::Error;

/// Result type for board operations
pub type Result<T> = std::result::Result<T, BoardError>;

/// Errors that can occur in board operations
#[derive(Debug, Error)]
pub enum BoardError {
    /// Column not found in the working snapshot
    #[error("column not found: {id}")]
    ColumnNotFound { id: String },

    /// Card not found in the working snapshot
    #[error("card not found: {id}")]
    CardNotFound { id: String },

    /// Column has cards and cannot be deleted
    #[error("column '{id}' has {count} cards and cannot be deleted")]
    ColumnNotEmpty { id: String, count: usize },

    /// A drag gesture is already active
    #[error("a drag is already in progress")]
    DragInProgress,

    /// No drag gesture is active
    #[error("no drag in progress")]
    NoActiveDrag,

    /// Snapshot violates a board invariant
    #[error("invalid snapshot: {message}")]
    InvalidSnapshot { message: String },

    /// Remote collaborator rejected or failed a call
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl BoardError {
    /// Create an invalid snapshot error
    pub fn invalid_snapshot(message: impl Into<String>) -> Self {
        Self::InvalidSnapshot {
            message: message.into(),
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<figment::Error> for BoardError {
    fn from(e: figment::Error) -> Self {
        Self::Config(e.to_string())
    }
}

/// Errors raised by the remote board API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or connection failure
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// 401 - token missing, invalid or expired
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// 404 - stage or acquisition does not exist on the server
    #[error("not found: {0}")]
    NotFound(String),

    /// 409 - server state changed underneath the request
    #[error("conflict: {0}")]
    Conflict(String),

    /// Any other non-success status
    #[error("API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape
    #[error("could not decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Transport failures and server-side errors may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
