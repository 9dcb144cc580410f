//! Realtime sync channel
//!
//! One [`RealtimeHub`] owns the `/ws` connection for the whole client.
//! Feature areas mount it through reference-counted
//! [`NotificationSubscription`] handles; the socket lives while at least one
//! handle does and a session is authenticated.

mod hub;
mod transport;

pub use hub::{NotificationSubscription, RealtimeHub};
pub use transport::{Frame, RealtimeConnection, RealtimeConnector, WsConnector};

use std::fmt;
use std::time::Duration;

/// Snapshot fetches are never closer together than this
pub const MIN_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(1);

/// Realtime channel tuning
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// First reconnect delay
    pub reconnect_base: Duration,
    /// Reconnect delay cap
    pub reconnect_max: Duration,
    /// Reconnect attempts before the channel gives up until retriggered
    pub max_attempts: u32,
    /// Minimum spacing of mount/reconnect snapshots (clamped to >= 1s)
    pub snapshot_throttle: Duration,
    /// Quiet period after a count-relevant event before recounting
    pub recount_debounce: Duration,
    /// Keepalive ping interval
    pub ping_interval: Duration,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            reconnect_base: Duration::from_secs(1),
            reconnect_max: Duration::from_secs(30),
            max_attempts: 5,
            snapshot_throttle: MIN_SNAPSHOT_INTERVAL,
            recount_debounce: Duration::from_millis(300),
            ping_interval: Duration::from_secs(30),
        }
    }
}

impl RealtimeConfig {
    /// LAN 场景：快速重连
    pub fn lan() -> Self {
        Self {
            reconnect_base: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(10),
            max_attempts: 10,
            ..Default::default()
        }
    }

    /// WAN 场景：更保守的退避
    pub fn wan() -> Self {
        Self {
            reconnect_base: Duration::from_secs(2),
            reconnect_max: Duration::from_secs(60),
            max_attempts: 5,
            ping_interval: Duration::from_secs(20),
            ..Default::default()
        }
    }

    pub fn with_reconnect(mut self, base: Duration, max: Duration) -> Self {
        self.reconnect_base = base;
        self.reconnect_max = max;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_snapshot_throttle(mut self, throttle: Duration) -> Self {
        self.snapshot_throttle = throttle;
        self
    }

    pub fn with_recount_debounce(mut self, debounce: Duration) -> Self {
        self.recount_debounce = debounce;
        self
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }

    /// Effective snapshot spacing
    pub fn snapshot_interval(&self) -> Duration {
        self.snapshot_throttle.max(MIN_SNAPSHOT_INTERVAL)
    }

    /// Delay before reconnect attempt `attempt` (0-based):
    /// `min(base * 2^attempt, max)`, `None` once attempts are exhausted
    pub fn backoff_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        let delay = self
            .reconnect_base
            .checked_mul(factor)
            .unwrap_or(self.reconnect_max);
        Some(delay.min(self.reconnect_max))
    }
}

/// Connection lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closing => write!(f, "closing"),
        }
    }
}

/// Status broadcast for connection indicators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Consecutive failed reconnect attempts
    pub attempt: u32,
    /// Retries exhausted, waiting for [`RealtimeHub::retrigger`]
    pub exhausted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_non_decreasing_and_capped() {
        let config = RealtimeConfig::default();
        let delays: Vec<_> = (0..config.max_attempts)
            .map(|n| config.backoff_delay(n).unwrap())
            .collect();
        assert_eq!(delays[0], Duration::from_secs(1));
        assert_eq!(delays[1], Duration::from_secs(2));
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
        assert!(delays.iter().all(|d| *d <= config.reconnect_max));
    }

    #[test]
    fn test_backoff_ceases_after_max_attempts() {
        let config = RealtimeConfig::default().with_max_attempts(3);
        assert!(config.backoff_delay(2).is_some());
        assert!(config.backoff_delay(3).is_none());
        assert!(config.backoff_delay(100).is_none());
    }

    #[test]
    fn test_backoff_large_attempt_saturates() {
        let config = RealtimeConfig::default().with_max_attempts(u32::MAX);
        assert_eq!(config.backoff_delay(40), Some(config.reconnect_max));
        assert_eq!(config.backoff_delay(7), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_snapshot_interval_clamped() {
        let config = RealtimeConfig::default().with_snapshot_throttle(Duration::from_millis(10));
        assert_eq!(config.snapshot_interval(), Duration::from_secs(1));
        let config = config.with_snapshot_throttle(Duration::from_secs(5));
        assert_eq!(config.snapshot_interval(), Duration::from_secs(5));
    }
}
