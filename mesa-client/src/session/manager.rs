//! Session manager
//!
//! Owns the single live session of this client. login / logout / restore are
//! serialized on `op_lock`; network calls made while validating a restored
//! session run outside the lock and are discarded if the session generation
//! moved on in the meantime (e.g. a logout).

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use shared::User;
use shared::client::LoginRequest;
use tokio::sync::{Mutex, watch};

use super::{Session, SessionState, SessionStore, StoreError};
use crate::http::AuthApi;
use crate::{ClientError, ClientResult};

pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn SessionStore>,
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
    op_lock: Mutex<()>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.borrow())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn SessionStore>) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);
        Self {
            api,
            store,
            state,
            generation: AtomicU64::new(0),
            op_lock: Mutex::new(()),
        }
    }

    /// Authenticate and persist the session
    ///
    /// Storage is written before the in-memory state is published; if the
    /// write fails no session is published and the error is returned. A
    /// failed login leaves a still-loading state resolved as anonymous.
    pub async fn login(&self, request: LoginRequest) -> ClientResult<Session> {
        let _guard = self.op_lock.lock().await;

        let result = self.authenticate(&request).await;
        let loading = self.state.borrow().is_loading();
        if result.is_err() && loading {
            self.publish(SessionState::Anonymous);
        }
        result
    }

    async fn authenticate(&self, request: &LoginRequest) -> ClientResult<Session> {
        let response = self.api.login(request).await?;
        if response.token.trim().is_empty() {
            return Err(ClientError::InvalidResponse("Empty token in login response".into()));
        }

        let session = Session::new(response.token, response.user);
        self.store.save(&session)?;
        self.publish(SessionState::Authenticated(session.clone()));

        tracing::info!(user = %session.user.username, role = %session.user.role, "Login succeeded");
        Ok(session)
    }

    /// Restore the persisted session and re-validate it with the server
    ///
    /// Returns `Ok(None)` when nothing is stored, the record was corrupt, or
    /// the validation was superseded by another session operation.
    pub async fn restore_session(&self) -> ClientResult<Option<Session>> {
        let (provisional, generation) = {
            let _guard = self.op_lock.lock().await;
            match self.store.load() {
                Ok(Some(session)) => {
                    let generation = self.publish(SessionState::Provisional(session.clone()));
                    (session, generation)
                }
                Ok(None) => {
                    self.publish(SessionState::Anonymous);
                    return Ok(None);
                }
                Err(StoreError::Corrupt(reason)) => {
                    tracing::warn!(reason = %reason, "Purging corrupt session record");
                    self.clear_store();
                    self.publish(SessionState::Anonymous);
                    return Ok(None);
                }
                Err(e) => {
                    self.publish(SessionState::Anonymous);
                    return Err(e.into());
                }
            }
        };

        // 网络请求期间不持锁，logout 可以插队
        let result = self.api.me(&provisional.token).await;

        let _guard = self.op_lock.lock().await;
        if self.generation() != generation {
            tracing::debug!("Session validation superseded, discarding result");
            return Ok(None);
        }

        match result {
            Ok(user) => {
                let session = provisional.with_user(user);
                if let Err(e) = self.store.save(&session) {
                    tracing::warn!(error = %e, "Failed to persist refreshed user");
                }
                self.publish(SessionState::Authenticated(session.clone()));
                tracing::info!(user = %session.user.username, "Session restored");
                Ok(Some(session))
            }
            Err(e) if e.is_auth_failure() => {
                tracing::info!(error = %e, "Stored session rejected by server");
                self.clear_store();
                self.publish(SessionState::Anonymous);
                Err(e)
            }
            Err(e) => {
                // 保留存储，下次启动再试
                tracing::warn!(error = %e, "Session validation failed, staying logged out");
                self.publish(SessionState::Anonymous);
                Err(e)
            }
        }
    }

    /// Clear local state, then invalidate the token on the server (best effort)
    pub async fn logout(&self) {
        let token = {
            let _guard = self.op_lock.lock().await;
            let token = self
                .token()
                .or_else(|| self.store.load().ok().flatten().map(|s| s.token));
            self.clear_store();
            self.publish(SessionState::Anonymous);
            token
        };

        if let Some(token) = token
            && let Err(e) = self.api.logout(&token).await
        {
            tracing::warn!(error = %e, "Server logout failed, local session already cleared");
        }
        tracing::info!("Logged out");
    }

    /// Re-fetch the current user and update the stored copy
    ///
    /// Network failures keep the cached user; an auth failure ends the session.
    pub async fn refresh_user_data(&self) -> ClientResult<Option<User>> {
        let Some(session) = self.state.borrow().validated().cloned() else {
            return Ok(None);
        };
        let generation = self.generation();

        let result = self.api.me(&session.token).await;

        let _guard = self.op_lock.lock().await;
        if self.generation() != generation {
            return Ok(None);
        }

        match result {
            Ok(user) => {
                let updated = session.with_user(user.clone());
                if let Err(e) = self.store.save(&updated) {
                    tracing::warn!(error = %e, "Failed to persist refreshed user");
                }
                // 同一个会话，不推进 generation
                self.state.send_replace(SessionState::Authenticated(updated));
                Ok(Some(user))
            }
            Err(e) if e.is_auth_failure() => {
                tracing::info!(error = %e, "Session rejected during refresh");
                self.clear_store();
                self.publish(SessionState::Anonymous);
                Err(e)
            }
            Err(e) => {
                tracing::warn!(error = %e, "User refresh failed, keeping cached user");
                Err(e)
            }
        }
    }

    /// Current state snapshot
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Watch session changes
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    /// Token of the live session, provisional or validated
    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_owned)
    }

    /// Token of a server-confirmed session only
    pub fn validated_token(&self) -> Option<String> {
        self.state.borrow().validated().map(|s| s.token.clone())
    }

    /// Bumped every time a different session (or none) is published
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn publish(&self, state: SessionState) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.send_replace(state);
        generation
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "Failed to clear session storage");
        }
    }
}
