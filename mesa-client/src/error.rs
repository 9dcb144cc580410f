//! Client error types

use shared::ErrorCode;
use thiserror::Error;

use crate::session::StoreError;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Login rejected. Deliberately does not say which field was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Authentication required
    #[error("Authentication required: {0}")]
    Unauthorized(String),

    /// Token expired
    #[error("Token expired")]
    TokenExpired,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Structured error returned by the server
    #[error("API error {code}: {message}")]
    Api { code: ErrorCode, message: String },

    /// Realtime connection failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Durable session storage failure
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// Bad credentials or an invalid/expired token
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ClientError::InvalidCredentials
            | ClientError::Unauthorized(_)
            | ClientError::TokenExpired => true,
            ClientError::Api { code, .. } => (1001..2000).contains(&code.code()),
            ClientError::Http(e) => e
                .status()
                .is_some_and(|s| s == reqwest::StatusCode::UNAUTHORIZED),
            _ => false,
        }
    }

    /// Transient transport failure, safe to retry
    pub fn is_network(&self) -> bool {
        match self {
            ClientError::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            ClientError::Connection(_) => true,
            ClientError::Api { code, .. } => {
                matches!(code, ErrorCode::NetworkError | ErrorCode::TimeoutError)
            }
            _ => false,
        }
    }

    /// Unified error code for UI messaging
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::InvalidCredentials => ErrorCode::InvalidCredentials,
            ClientError::Unauthorized(_) => ErrorCode::NotAuthenticated,
            ClientError::TokenExpired => ErrorCode::TokenExpired,
            ClientError::Forbidden(_) => ErrorCode::PermissionDenied,
            ClientError::NotFound(_) => ErrorCode::NotFound,
            ClientError::InvalidResponse(_) | ClientError::Serialization(_) => {
                ErrorCode::InvalidFormat
            }
            ClientError::Api { code, .. } => *code,
            ClientError::Config(_) => ErrorCode::ConfigError,
            ClientError::Http(e) if e.is_timeout() => ErrorCode::TimeoutError,
            ClientError::Http(_) | ClientError::Connection(_) => ErrorCode::NetworkError,
            ClientError::Storage(_) | ClientError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
