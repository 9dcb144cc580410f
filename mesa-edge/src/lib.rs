//! Mesa Edge - server-side enforcement for the back-office API
//!
//! The client-side evaluator is advisory. Every request reaching a protected
//! route is re-authenticated through a [`TokenVerifier`] and re-checked
//! against the same [`PermissionEvaluator`](shared::PermissionEvaluator);
//! mutations of critical modules are audited on the `security` target.

pub mod auth;
pub mod error;
pub mod logger;
pub mod routes;

pub use auth::{
    AuthState, CurrentUser, CurrentUserExt, InMemoryTokenVerifier, TokenVerifier, VerifyError,
    action_for_method, require_auth, require_module, require_permission, require_role,
};
pub use error::{AppError, AppResult};
pub use logger::{init_logger, init_logger_with_file};
pub use routes::build_app;

/// Security event log
///
/// Written to the `security` target at the level named by the first token.
///
/// ```ignore
/// security_log!("WARN", "permission_denied", user_id = user.id.clone());
/// ```
#[macro_export]
macro_rules! security_log {
    ("WARN", $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::warn!(
            target: "security",
            event = $event,
            timestamp = chrono::Utc::now().to_rfc3339(),
            level = "WARN",
            $($key = $value),*
        );
    };
    ("ERROR", $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::error!(
            target: "security",
            event = $event,
            timestamp = chrono::Utc::now().to_rfc3339(),
            level = "ERROR",
            $($key = $value),*
        );
    };
    ($level:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            target: "security",
            event = $event,
            timestamp = chrono::Utc::now().to_rfc3339(),
            level = $level,
            $($key = $value),*
        );
    };
}
