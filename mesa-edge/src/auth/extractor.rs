//! CurrentUser extractor

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::AppError;
use crate::auth::CurrentUser;

/// Handlers behind [`require_auth`](super::require_auth) take `CurrentUser`
/// directly; a missing extension means the route was mounted without the
/// middleware and is rejected as unauthenticated.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::unauthorized())
    }
}
