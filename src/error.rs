//! Error types for Skald client operations.
//!
//! | Variant | Source | Retryable |
//! |---------|--------|-----------|
//! | `RequestConstruction` | body/URL could not be built, nothing sent | No |
//! | `Transport` | connection, DNS, reset, timeout | Yes |
//! | `Api` | non-2xx status from the server | 5xx/408/429 only |
//! | `Cancelled` | caller cancelled the token or dropped the stream | No |
//! | `Decode` | 2xx body was not the expected JSON | No |
//!
//! Retryability is advisory; the client itself never retries.

use thiserror::Error;

use crate::traits::HttpError;

/// Convenience result alias.
pub type SkaldResult<T> = Result<T, SkaldError>;

/// Non-2xx response from the Skald API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("skald API error ({status_code}): {message}")]
pub struct ApiError {
    /// HTTP status code
    pub status_code: u16,
    /// Raw response body
    pub message: String,
}

impl ApiError {
    pub fn new(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code == 404
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status_code == 401
    }

    pub fn is_bad_request(&self) -> bool {
        self.status_code == 400
    }
}

/// Error type for every Skald client operation.
#[derive(Debug, Error)]
pub enum SkaldError {
    /// The request could not be built; nothing was sent
    #[error("failed to build request: {0}")]
    RequestConstruction(String),

    /// Network-level failure while connecting or reading the body
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    /// Server answered with a non-2xx status
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The caller's cancellation token fired
    #[error("request cancelled")]
    Cancelled,

    /// A successful response body did not decode
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Argument rejected before any request was made
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Local file could not be read for upload
    #[error("file error: {0}")]
    Io(#[from] std::io::Error),

    /// Upload exceeds the server's size limit
    #[error("file size {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    /// The memo finished processing with status `error`
    #[error("memo processing failed: {}", .reason.as_deref().unwrap_or("no reason given"))]
    MemoProcessingFailed { reason: Option<String> },

    /// Client configuration is incomplete or invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// The task driving a streaming call panicked or was aborted
    #[error("streaming task failed: {0}")]
    TaskFailed(String),
}

impl SkaldError {
    /// True if the caller gave up, as opposed to something breaking.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SkaldError::Cancelled)
    }

    /// HTTP status code for API errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            SkaldError::Api(err) => Some(err.status_code),
            _ => None,
        }
    }

    /// The structured API error, if this is one.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            SkaldError::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Check if this error is likely transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            SkaldError::Transport(err) => !matches!(err, HttpError::InvalidUrl(_)),
            SkaldError::Api(err) => {
                err.status_code >= 500 || err.status_code == 429 || err.status_code == 408
            }
            _ => false,
        }
    }
}
