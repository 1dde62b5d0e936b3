//! Error types module
//!
//! All pipeline failures are unified under the `AppError` enum. The pipeline
//! exposes exactly one client-error kind (`InvalidArgument`): malformed chain
//! syntax, out-of-range parameters, unknown action names, unresolvable styles
//! and structurally invalid images all map to it. Store misses stay `NotFound`
//! and are propagated without translation so the transport layer can map them
//! to a not-found response. Everything else is `Internal`.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("InvalidArgument: {0}")]
    InvalidArgument(String),

    #[error("NotFound: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        AppError::InvalidArgument(msg.into())
    }

    /// HTTP status code a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::InvalidArgument(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::Internal(_) => 500,
        }
    }

    /// Machine-readable error code (e.g. "INVALID_ARGUMENT")
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Client-caused errors are non-retryable by contract.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::InvalidArgument(_) | AppError::NotFound(_))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidArgument(format!("JSON parsing error: {}", err))
    }
}
