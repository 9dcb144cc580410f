//! Mesa Client - back-office client for the Mesa edge server
//!
//! Session lifecycle, permission-aware guards and the live notification
//! channel. [`MesaClient`] wires them together from a [`ClientConfig`].

pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod notification;
pub mod realtime;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use guard::{Access, AccessDenied, AccessGuard, Navigator, Rendered, RouteDecision, RouteGuard};
pub use http::{AuthApi, NetworkHttpClient, NotificationApi};
pub use notification::NotificationStore;
pub use realtime::{
    ConnectionState, ConnectionStatus, NotificationSubscription, RealtimeConfig, RealtimeHub,
    WsConnector,
};
pub use session::{
    FileSessionStore, MemorySessionStore, Session, SessionManager, SessionState, SessionStore,
};

// Re-export shared types for convenience
pub use shared::client::{LoginRequest, LoginResponse};
pub use shared::{
    CapabilitySet, Module, NotificationCounts, PermissionAction, PermissionEvaluator,
    PermissionMatrix, Role, User,
};

/// Fully wired client
#[derive(Debug, Clone)]
pub struct MesaClient {
    config: ClientConfig,
    session: Arc<SessionManager>,
    evaluator: PermissionEvaluator,
    realtime: Arc<RealtimeHub>,
}

impl MesaClient {
    /// Build the HTTP client, file session store, evaluator and realtime hub
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let http = Arc::new(NetworkHttpClient::new(&config)?);
        let store = Arc::new(FileSessionStore::new(&config.session_file));
        let evaluator = PermissionEvaluator::new(Self::load_matrix(&config)?);
        let connector = Arc::new(WsConnector::new(config.ws_url()));

        let session = Arc::new(SessionManager::new(http.clone(), store));
        let realtime = Arc::new(RealtimeHub::new(
            config.realtime.clone(),
            session.clone(),
            http,
            connector,
        ));

        tracing::debug!(base_url = %config.base_url, "Mesa client initialized");
        Ok(Self {
            config,
            session,
            evaluator,
            realtime,
        })
    }

    fn load_matrix(config: &ClientConfig) -> ClientResult<PermissionMatrix> {
        let Some(path) = &config.permission_matrix else {
            return Ok(PermissionMatrix::default());
        };
        let json = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("Cannot read permission matrix {}: {e}", path.display()))
        })?;
        let matrix = PermissionMatrix::from_json(&json)
            .map_err(|e| ClientError::Config(format!("Invalid permission matrix: {e}")))?;
        tracing::info!(path = %path.display(), "Loaded permission matrix");
        Ok(matrix)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    pub fn realtime(&self) -> &Arc<RealtimeHub> {
        &self.realtime
    }

    /// Guard for protected regions
    pub fn access_guard(&self) -> AccessGuard {
        AccessGuard::new(self.session.clone(), self.evaluator.clone())
    }

    /// Guard for a route, redirecting to the default login path
    pub fn route_guard(&self) -> RouteGuard {
        RouteGuard::new(self.session.clone())
    }

    pub async fn login(&self, request: LoginRequest) -> ClientResult<Session> {
        self.session.login(request).await
    }

    pub async fn restore_session(&self) -> ClientResult<Option<Session>> {
        self.session.restore_session().await
    }

    pub async fn logout(&self) {
        self.session.logout().await
    }

    /// Mount the live notification channel
    pub fn notifications(&self) -> NotificationSubscription {
        self.realtime.mount()
    }
}
