//! Session lifecycle
//!
//! - [`Session`]: token + user, persisted as one record
//! - [`SessionStore`]: durable storage (file or memory)
//! - [`SessionManager`]: login / restore / logout / refresh

mod manager;
mod store;

pub use manager::SessionManager;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoreError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{Role, User};

/// Authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub issued_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self {
            token: token.into(),
            user,
            issued_at: Utc::now(),
        }
    }

    /// Same token and issue time, fresh user data
    pub fn with_user(&self, user: User) -> Self {
        Self {
            token: self.token.clone(),
            user,
            issued_at: self.issued_at,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.user.role()
    }
}

/// Published session state
///
/// `Provisional` is a session read back from storage that the server has not
/// confirmed yet. It identifies the user but never unlocks critical modules.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// Restore has not run yet
    #[default]
    Loading,
    Anonymous,
    Provisional(Session),
    Authenticated(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Provisional(s) | SessionState::Authenticated(s) => Some(s),
            SessionState::Loading | SessionState::Anonymous => None,
        }
    }

    /// Session confirmed by the server
    pub fn validated(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(s) => Some(s),
            _ => None,
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.session().map(|s| &s.user)
    }

    pub fn token(&self) -> Option<&str> {
        self.session().map(|s| s.token.as_str())
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, SessionState::Provisional(_))
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }
}
