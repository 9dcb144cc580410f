//! Client configuration

use std::path::PathBuf;

use crate::realtime::RealtimeConfig;

/// Default session record file name (token + user in one record)
pub const DEFAULT_SESSION_FILE: &str = "mesa-session.json";

/// Realtime endpoint path on the same origin
pub const REALTIME_PATH: &str = "/ws";

/// Client configuration for connecting to the back-office server
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "https://resto.example.com")
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout: u64,

    /// Durable session record location
    pub session_file: PathBuf,

    /// Optional JSON permission matrix replacing the built-in defaults
    pub permission_matrix: Option<PathBuf>,

    /// Realtime channel tuning
    pub realtime: RealtimeConfig,
}

impl ClientConfig {
    /// Create a new client configuration
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: 30,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            permission_matrix: None,
            realtime: RealtimeConfig::default(),
        }
    }

    /// Read configuration from the environment
    ///
    /// | variable | default |
    /// |----------|---------|
    /// | `MESA_BASE_URL` | `http://localhost:3000` |
    /// | `MESA_TIMEOUT_SECS` | `30` |
    /// | `MESA_SESSION_FILE` | `mesa-session.json` |
    /// | `MESA_PERMISSION_MATRIX` | built-in table |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("MESA_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let mut config = Self::new(base_url);

        if let Some(timeout) = std::env::var("MESA_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout = timeout;
        }
        if let Ok(path) = std::env::var("MESA_SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("MESA_PERMISSION_MATRIX") {
            config.permission_matrix = Some(PathBuf::from(path));
        }
        config
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }

    /// Set the session record location
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }

    /// Load the permission matrix from a JSON file
    pub fn with_permission_matrix(mut self, path: impl Into<PathBuf>) -> Self {
        self.permission_matrix = Some(path.into());
        self
    }

    /// Set realtime tuning
    pub fn with_realtime(mut self, realtime: RealtimeConfig) -> Self {
        self.realtime = realtime;
        self
    }

    /// Realtime URL: same origin, `wss:` for `https:` and `ws:` for `http:`
    pub fn ws_url(&self) -> String {
        let origin = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{}", self.base_url)
        };
        format!("{origin}{REALTIME_PATH}")
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:3000")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_url_mirrors_scheme() {
        assert_eq!(
            ClientConfig::new("https://resto.example.com/").ws_url(),
            "wss://resto.example.com/ws"
        );
        assert_eq!(
            ClientConfig::new("http://127.0.0.1:3000").ws_url(),
            "ws://127.0.0.1:3000/ws"
        );
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::new("http://localhost:3000")
            .with_timeout(5)
            .with_session_file("/tmp/s.json");
        assert_eq!(config.timeout, 5);
        assert_eq!(config.session_file, PathBuf::from("/tmp/s.json"));
        assert!(config.permission_matrix.is_none());
    }
}
