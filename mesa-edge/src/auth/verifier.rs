//! Token verification
//!
//! The edge server never trusts a role sent by the client: every token is
//! resolved to a [`User`] through a [`TokenVerifier`].

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shared::User;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    /// Backing store unreachable, not an authentication failure
    #[error("Verifier unavailable: {0}")]
    Unavailable(String),
}

/// Resolves a bearer token to the user it belongs to
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<User, VerifyError>;
}

#[derive(Debug, Clone)]
struct TokenEntry {
    user_id: String,
    expires_at: Option<DateTime<Utc>>,
}

/// In-process token table
///
/// Users are stored once and looked up by id on every verification, so a
/// role change or override edit applies to tokens already issued.
#[derive(Debug, Default)]
pub struct InMemoryTokenVerifier {
    tokens: RwLock<HashMap<String, TokenEntry>>,
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token that never expires
    pub fn insert(&self, token: impl Into<String>, user: User) {
        self.insert_entry(token.into(), user, None);
    }

    pub fn insert_expiring(&self, token: impl Into<String>, user: User, expires_at: DateTime<Utc>) {
        self.insert_entry(token.into(), user, Some(expires_at));
    }

    /// Replace the stored user, keeping its tokens
    pub fn update_user(&self, user: User) {
        self.users.write().insert(user.id.clone(), user);
    }

    /// Returns `false` if the token was unknown
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.write().remove(token).is_some()
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }

    fn insert_entry(&self, token: String, user: User, expires_at: Option<DateTime<Utc>>) {
        let entry = TokenEntry {
            user_id: user.id.clone(),
            expires_at,
        };
        self.users.write().insert(user.id.clone(), user);
        self.tokens.write().insert(token, entry);
    }
}

#[async_trait]
impl TokenVerifier for InMemoryTokenVerifier {
    async fn verify(&self, token: &str) -> Result<User, VerifyError> {
        let entry = self
            .tokens
            .read()
            .get(token)
            .cloned()
            .ok_or(VerifyError::Invalid)?;

        if entry.expires_at.is_some_and(|at| at <= Utc::now()) {
            return Err(VerifyError::Expired);
        }

        // 用户被删除后令牌随之失效
        self.users
            .read()
            .get(&entry.user_id)
            .cloned()
            .ok_or(VerifyError::Invalid)
    }
}
