//! Router assembly
//!
//! Protected API routers are wrapped with [`require_auth`] plus the shared
//! CORS and tracing layers.

use axum::{
    Json, Router,
    extract::State,
    middleware,
    routing::get,
};
use shared::{ApiResponse, CapabilitySet, User};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{AuthState, CurrentUser, require_auth};
use crate::error::ok;

/// Wrap `api` with authentication and the common layers
///
/// `/health`, `/api/auth/me` and `/api/auth/capabilities` are added here;
/// everything else comes from the caller, with per-route
/// `require_permission` layers already applied.
pub fn build_app(api: Router<AuthState>, state: AuthState) -> Router {
    api.route("/health", get(health))
        .route("/api/auth/me", get(me))
        .route("/api/auth/capabilities", get(capabilities))
        // 使用 from_fn_with_state 以便中间件可以访问验证器
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> &'static str {
    "ok"
}

async fn me(user: CurrentUser) -> Json<ApiResponse<User>> {
    ok(user.user)
}

async fn capabilities(
    State(state): State<AuthState>,
    user: CurrentUser,
) -> Json<ApiResponse<CapabilitySet>> {
    ok(state.evaluator.capabilities(&user.user))
}
