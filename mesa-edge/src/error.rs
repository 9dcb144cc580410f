//! 统一错误处理
//!
//! [`AppError`] converts into a JSON [`ApiResponse`] body with the status
//! derived from its [`ErrorCode`]:
//!
//! ```json
//! { "code": "E2003", "message": "Permission denied: edit on settings" }
//! ```

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use shared::{ApiResponse, ErrorCode};
use tracing::error;

/// 应用错误枚举
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 认证错误 (401) ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // ========== 权限错误 (403) ==========
    #[error("{message}")]
    Forbidden { code: ErrorCode, message: String },

    // ========== 请求错误 (4xx) ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    pub fn token_expired() -> Self {
        Self::TokenExpired
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden {
            code: ErrorCode::PermissionDenied,
            message: msg.into(),
        }
    }

    /// Denial on a critical module
    pub fn critical_denied(msg: impl Into<String>) -> Self {
        Self::Forbidden {
            code: ErrorCode::CriticalModuleDenied,
            message: msg.into(),
        }
    }

    pub fn role_required(msg: impl Into<String>) -> Self {
        Self::Forbidden {
            code: ErrorCode::RoleRequired,
            message: msg.into(),
        }
    }

    /// The matrix has no entry for the caller's role on this module
    pub fn module_not_configured(msg: impl Into<String>) -> Self {
        Self::Forbidden {
            code: ErrorCode::ModuleNotConfigured,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Unauthorized => ErrorCode::NotAuthenticated,
            AppError::TokenExpired => ErrorCode::TokenExpired,
            AppError::InvalidToken(_) => ErrorCode::TokenInvalid,
            AppError::Forbidden { code, .. } => *code,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Validation(_) => ErrorCode::ValidationFailed,
            AppError::Unavailable(_) => ErrorCode::NetworkError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = match &self {
            AppError::Forbidden { message, .. } => message.clone(),
            AppError::NotFound(msg) | AppError::Validation(msg) => msg.clone(),
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                code.message().to_string()
            }
            AppError::Unavailable(msg) => {
                error!(target: "internal", error = %msg, "Upstream unavailable");
                code.message().to_string()
            }
            // 认证类错误只返回统一文案
            _ => code.message().to_string(),
        };

        let body = Json(ApiResponse::<()>::error(code, message));
        (code.http_status(), body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Create a successful response
pub fn ok<T: serde::Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}
