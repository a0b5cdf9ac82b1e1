//! Shared error type across zero crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed payload.
    BadRequest,
    /// Requested record does not exist.
    NotFound,
    /// Service is draining and no longer accepts traffic.
    Unavailable,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and tests.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Unavailable => "UNAVAILABLE",
            ClientCode::Internal => "INTERNAL",
        }
    }

    /// HTTP status written into the `httpStatus` field of the error envelope.
    /// `Unavailable` maps to a plain 500.
    pub fn http_status(self) -> u16 {
        match self {
            ClientCode::BadRequest => 400,
            ClientCode::NotFound => 404,
            ClientCode::Unavailable => 500,
            ClientCode::Internal => 500,
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ZeroError>;

/// Unified error type used by core and server.
///
/// User-facing variants render their message verbatim because the message is
/// what ends up in the `error` field of the response envelope.
#[derive(Debug, Error)]
pub enum ZeroError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ZeroError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            ZeroError::BadRequest(_) => ClientCode::BadRequest,
            ZeroError::NotFound(_) => ClientCode::NotFound,
            ZeroError::Unavailable(_) => ClientCode::Unavailable,
            ZeroError::Config(_) | ZeroError::Internal(_) => ClientCode::Internal,
        }
    }
}
