//! API Response types
//!
//! Standardized API response envelope shared by the edge server and the client

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Standard API response code
pub const API_CODE_SUCCESS: &str = "E0000";

/// Unified API response structure
///
/// ```json
/// {
///     "code": "E0000",
///     "message": "Success",
///     "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Response code (E0000 = success, others = error codes)
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Response data (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn ok(data: T) -> Self {
        Self {
            code: API_CODE_SUCCESS.to_string(),
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    /// Create an error response from an error code
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.api_code(),
            message: message.into(),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == API_CODE_SUCCESS
    }

    /// Parse the `Exxxx` code back into an [`ErrorCode`]
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.code
            .strip_prefix('E')
            .and_then(|n| n.parse::<u16>().ok())
            .and_then(|n| ErrorCode::try_from(n).ok())
    }
}

impl ApiResponse<()> {
    /// Create a successful response without data
    pub fn success() -> Self {
        Self {
            code: API_CODE_SUCCESS.to_string(),
            message: "Success".to_string(),
            data: None,
        }
    }
}
