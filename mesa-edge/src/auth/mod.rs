//! 认证授权模块
//!
//! - [`require_auth`]: bearer token → [`CurrentUser`] in request extensions
//! - [`require_permission`] / [`require_module`]: evaluator check per route
//! - [`require_role`]: role gate for routes outside the module matrix
//! - [`TokenVerifier`]: token → user resolution

mod extractor;
mod middleware;
mod verifier;

use std::fmt;
use std::sync::Arc;

use shared::{PermissionEvaluator, Role, User};

use crate::AppError;

pub use middleware::{
    CurrentUserExt, action_for_method, require_auth, require_module, require_permission,
    require_role,
};
pub use verifier::{InMemoryTokenVerifier, TokenVerifier, VerifyError};

/// Shared state for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn TokenVerifier>,
    pub evaluator: PermissionEvaluator,
}

impl AuthState {
    pub fn new(verifier: Arc<dyn TokenVerifier>, evaluator: PermissionEvaluator) -> Self {
        Self {
            verifier,
            evaluator,
        }
    }

    /// Resolve a token through the verifier
    pub async fn resolve(&self, token: &str) -> Result<CurrentUser, AppError> {
        match self.verifier.verify(token).await {
            Ok(user) => Ok(CurrentUser {
                user,
                token: token.to_string(),
            }),
            Err(VerifyError::Expired) => Err(AppError::token_expired()),
            Err(VerifyError::Invalid) => Err(AppError::invalid_token("Invalid token")),
            Err(VerifyError::Unavailable(msg)) => Err(AppError::Unavailable(msg)),
        }
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}

/// Authenticated caller, inserted by [`require_auth`]
#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
    token: String,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.user.id
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn role(&self) -> Option<Role> {
        self.user.role()
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentUser")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}
