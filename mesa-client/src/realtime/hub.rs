//! RealtimeHub - 单连接 + 引用计数订阅
//!
//! The first [`NotificationSubscription`] spawns the worker; dropping the
//! last one cancels it. The worker:
//!
//! 1. waits for a server-validated session
//! 2. fetches a count snapshot (throttled, retried with backoff on failure)
//! 3. opens `/ws` and schedules a debounced recount on count-relevant events
//! 4. reconnects with exponential backoff until attempts run out, then parks
//!    until [`RealtimeHub::retrigger`] or a new session
//!
//! Counts are cleared on logout even while nothing is mounted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use shared::{ErrorCode, EventKind, NotificationCounts, RealtimeEvent};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{
    ConnectionState, ConnectionStatus, Frame, RealtimeConfig, RealtimeConnection,
    RealtimeConnector,
};
use crate::http::NotificationApi;
use crate::notification::{NotificationStore, RefreshTicket};
use crate::session::{SessionManager, SessionState};

/// Idle debounce deadline placeholder
const IDLE_DEADLINE: Duration = Duration::from_secs(3600);

/// Owner of the realtime connection and the notification counts
pub struct RealtimeHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: RealtimeConfig,
    session: Arc<SessionManager>,
    api: Arc<dyn NotificationApi>,
    connector: Arc<dyn RealtimeConnector>,
    store: NotificationStore,
    status: watch::Sender<ConnectionStatus>,
    retrigger: Notify,
    mount: Mutex<MountState>,
    /// Token and time of the last applied snapshot
    last_snapshot: Mutex<Option<(String, Instant)>>,
    session_watch: AtomicBool,
}

#[derive(Default)]
struct MountState {
    subscribers: usize,
    cancel: Option<CancellationToken>,
}

impl RealtimeHub {
    pub fn new(
        config: RealtimeConfig,
        session: Arc<SessionManager>,
        api: Arc<dyn NotificationApi>,
        connector: Arc<dyn RealtimeConnector>,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::default());
        let hub = Self {
            inner: Arc::new(HubInner {
                config,
                session,
                api,
                connector,
                store: NotificationStore::new(),
                status,
                retrigger: Notify::new(),
                mount: Mutex::new(MountState::default()),
                last_snapshot: Mutex::new(None),
                session_watch: AtomicBool::new(false),
            }),
        };
        if tokio::runtime::Handle::try_current().is_ok() {
            hub.inner.spawn_session_watch();
        }
        hub
    }

    /// Subscribe to live counts
    ///
    /// Must be called inside a Tokio runtime: the first subscription spawns
    /// the worker task.
    pub fn mount(&self) -> NotificationSubscription {
        self.inner.spawn_session_watch();
        let mut mount = self.inner.mount.lock();
        mount.subscribers += 1;
        if mount.subscribers == 1 {
            let cancel = CancellationToken::new();
            let worker = Worker {
                hub: self.inner.clone(),
                cancel: cancel.clone(),
                session_rx: self.inner.session.subscribe(),
                snapshot: None,
            };
            tokio::spawn(worker.run());
            mount.cancel = Some(cancel);
            tracing::debug!("Realtime hub mounted");
        }
        NotificationSubscription {
            hub: self.inner.clone(),
        }
    }

    /// Re-arm a channel that exhausted its reconnect attempts
    pub fn retrigger(&self) {
        self.inner.retrigger.notify_waiters();
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }

    pub fn counts(&self) -> NotificationCounts {
        self.inner.store.counts()
    }

    pub fn subscribe_counts(&self) -> watch::Receiver<NotificationCounts> {
        self.inner.store.subscribe()
    }

    pub fn subscribers(&self) -> usize {
        self.inner.mount.lock().subscribers
    }
}

impl std::fmt::Debug for RealtimeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeHub")
            .field("status", &self.status())
            .field("subscribers", &self.subscribers())
            .finish_non_exhaustive()
    }
}

/// Reference-counted mount of the hub; dropping it unmounts
#[must_use = "dropping the subscription unmounts it"]
pub struct NotificationSubscription {
    hub: Arc<HubInner>,
}

impl NotificationSubscription {
    pub fn counts(&self) -> NotificationCounts {
        self.hub.store.counts()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationCounts> {
        self.hub.store.subscribe()
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.hub.status.borrow()
    }
}

impl std::fmt::Debug for NotificationSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSubscription")
            .field("counts", &self.counts())
            .finish()
    }
}

impl Drop for NotificationSubscription {
    fn drop(&mut self) {
        self.hub.unmount();
    }
}

impl HubInner {
    /// Clear counts whenever the session ends, mounted or not
    fn spawn_session_watch(self: &Arc<Self>) {
        if self.session_watch.swap(true, Ordering::AcqRel) {
            return;
        }
        let hub = Arc::downgrade(self);
        let rx = self.session.subscribe();
        tokio::spawn(watch_session(hub, rx));
    }

    fn clear_counts(&self) {
        self.store.reset();
        *self.last_snapshot.lock() = None;
    }

    fn unmount(&self) {
        let mut mount = self.mount.lock();
        mount.subscribers = mount.subscribers.saturating_sub(1);
        if mount.subscribers > 0 {
            return;
        }
        if let Some(cancel) = mount.cancel.take() {
            cancel.cancel();
        }
        // 在途的 snapshot 作废，已有计数保留
        self.store.invalidate();
        self.status.send_replace(ConnectionStatus::default());
        tracing::debug!("Realtime hub unmounted");
    }

    /// Run `f` only while the worker owning `cancel` is still mounted
    fn guarded(&self, cancel: &CancellationToken, f: impl FnOnce()) {
        let _mount = self.mount.lock();
        if !cancel.is_cancelled() {
            f();
        }
    }

    fn set_status(
        &self,
        cancel: &CancellationToken,
        state: ConnectionState,
        attempt: u32,
        exhausted: bool,
    ) {
        self.guarded(cancel, || {
            self.status.send_replace(ConnectionStatus {
                state,
                attempt,
                exhausted,
            });
        });
    }

    fn begin_session(&self, cancel: &CancellationToken, token: &str) {
        self.guarded(cancel, || {
            let same = self
                .last_snapshot
                .lock()
                .as_ref()
                .is_some_and(|(last, _)| last == token);
            if !same {
                self.store.reset();
            }
        });
    }

    fn end_session(&self, cancel: &CancellationToken) {
        self.guarded(cancel, || self.clear_counts());
    }

    /// A snapshot for `token` was applied within the throttle interval
    fn snapshot_fresh(&self, token: &str) -> bool {
        self.last_snapshot
            .lock()
            .as_ref()
            .is_some_and(|(last_token, at)| {
                last_token == token && at.elapsed() < self.config.snapshot_interval()
            })
    }

    /// Fetch and apply one snapshot, retrying failures with the reconnect backoff
    async fn fetch_snapshot(&self, ticket: RefreshTicket, generation: u64, token: &str) {
        let mut attempt: u32 = 0;
        loop {
            let error = match self.api.notification_counts(token).await {
                Ok(counts) => {
                    if self.session.generation() != generation {
                        tracing::debug!("Session changed during snapshot, discarding");
                        return;
                    }
                    if self.store.apply(ticket, counts) {
                        *self.last_snapshot.lock() = Some((token.to_owned(), Instant::now()));
                        tracing::debug!(total = counts.total(), "Notification counts updated");
                    }
                    return;
                }
                Err(e) => e,
            };

            if error.is_auth_failure() || self.session.generation() != generation {
                tracing::warn!(error = %error, "Notification snapshot failed");
                return;
            }
            let Some(delay) = self.config.backoff_delay(attempt) else {
                tracing::warn!(
                    attempts = attempt + 1,
                    error = %error,
                    "Notification snapshot failed, giving up"
                );
                return;
            };
            attempt += 1;
            tracing::warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Notification snapshot failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

enum Exit {
    Cancelled,
    SessionChanged,
    Closed,
}

struct Worker {
    hub: Arc<HubInner>,
    cancel: CancellationToken,
    session_rx: watch::Receiver<SessionState>,
    snapshot: Option<JoinHandle<()>>,
}

impl Worker {
    async fn run(mut self) {
        tracing::debug!("Realtime worker started");

        loop {
            let token = tokio::select! {
                _ = self.cancel.cancelled() => break,
                token = next_validated(&mut self.session_rx, &self.hub, &self.cancel) => token,
            };

            self.hub.begin_session(&self.cancel, &token);
            self.request_snapshot(&token, true);

            match self.run_session(&token).await {
                Exit::Cancelled => break,
                Exit::SessionChanged | Exit::Closed => self.abort_snapshot(),
            }
        }

        self.abort_snapshot();
        tracing::debug!("Realtime worker stopped");
    }

    /// Connect / reconnect loop for one session token
    async fn run_session(&mut self, token: &str) -> Exit {
        let mut attempt: u32 = 0;

        loop {
            self.hub
                .set_status(&self.cancel, ConnectionState::Connecting, attempt, false);

            let connected = tokio::select! {
                _ = self.cancel.cancelled() => return Exit::Cancelled,
                _ = session_changed(&mut self.session_rx, token) => return Exit::SessionChanged,
                result = self.hub.connector.connect(token) => result,
            };

            match connected {
                Ok(conn) => {
                    attempt = 0;
                    self.hub.set_status(&self.cancel, ConnectionState::Open, 0, false);
                    tracing::info!("Realtime channel open");
                    self.request_snapshot(token, true);

                    match self.drive(conn, token).await {
                        Exit::Closed => {}
                        exit => return exit,
                    }
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Realtime connection failed");
                }
            }

            match self.hub.config.backoff_delay(attempt) {
                Some(delay) => {
                    attempt += 1;
                    self.hub
                        .set_status(&self.cancel, ConnectionState::Disconnected, attempt, false);
                    tracing::debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Scheduling realtime reconnect"
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Exit::Cancelled,
                        _ = session_changed(&mut self.session_rx, token) => return Exit::SessionChanged,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => {
                    // 先注册再发布状态，避免错过 retrigger
                    let retrigger = self.hub.retrigger.notified();
                    self.hub
                        .set_status(&self.cancel, ConnectionState::Disconnected, attempt, true);
                    tracing::warn!(
                        attempts = attempt,
                        "Realtime reconnect attempts exhausted, waiting for retrigger"
                    );
                    tokio::select! {
                        _ = self.cancel.cancelled() => return Exit::Cancelled,
                        _ = session_changed(&mut self.session_rx, token) => return Exit::SessionChanged,
                        _ = retrigger => {
                            tracing::info!("Realtime channel retriggered");
                            attempt = 0;
                        }
                    }
                }
            }
        }
    }

    /// Pump one open connection until it closes or the worker stops
    async fn drive(&mut self, mut conn: Box<dyn RealtimeConnection>, token: &str) -> Exit {
        let ping_every = self.hub.config.ping_interval;
        let debounce_window = self.hub.config.recount_debounce;
        let mut ping = tokio::time::interval_at(Instant::now() + ping_every, ping_every);
        let mut debounce_deadline: Option<Instant> = None;

        loop {
            let sleep_until = debounce_deadline.unwrap_or_else(|| Instant::now() + IDLE_DEADLINE);

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    conn.close().await;
                    return Exit::Cancelled;
                }

                _ = session_changed(&mut self.session_rx, token) => {
                    self.hub.set_status(&self.cancel, ConnectionState::Closing, 0, false);
                    conn.close().await;
                    self.hub.set_status(&self.cancel, ConnectionState::Disconnected, 0, false);
                    tracing::info!("Session changed, realtime channel closed");
                    return Exit::SessionChanged;
                }

                // Debounce timer fired → recount
                _ = tokio::time::sleep_until(sleep_until), if debounce_deadline.is_some() => {
                    debounce_deadline = None;
                    self.request_snapshot(token, false);
                }

                _ = ping.tick() => {
                    if let Err(e) = conn.ping().await {
                        tracing::warn!(error = %e, "Realtime ping failed, disconnecting");
                        return Exit::Closed;
                    }
                }

                frame = conn.next_frame() => {
                    match frame {
                        Some(Ok(Frame::Text(text))) => {
                            if is_recount(&text) {
                                debounce_deadline = Some(Instant::now() + debounce_window);
                            }
                        }
                        Some(Ok(Frame::Close)) => {
                            tracing::info!("Realtime channel closed by server");
                            return Exit::Closed;
                        }
                        Some(Ok(Frame::Other)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "Realtime channel error");
                            return Exit::Closed;
                        }
                        None => {
                            tracing::info!("Realtime stream ended");
                            return Exit::Closed;
                        }
                    }
                }
            }
        }
    }

    /// Spawn a snapshot fetch
    ///
    /// A throttled request is skipped while a fetch is in flight or one was
    /// applied recently; an unthrottled request replaces the in-flight fetch.
    fn request_snapshot(&mut self, token: &str, throttled: bool) {
        if throttled {
            let in_flight = self.snapshot.as_ref().is_some_and(|h| !h.is_finished());
            if in_flight || self.hub.snapshot_fresh(token) {
                tracing::debug!(in_flight, "Snapshot throttled");
                return;
            }
        }
        self.abort_snapshot();

        let hub = self.hub.clone();
        let token = token.to_owned();
        let ticket = hub.store.begin_refresh();
        let generation = hub.session.generation();
        self.snapshot = Some(tokio::spawn(async move {
            hub.fetch_snapshot(ticket, generation, &token).await;
        }));
    }

    fn abort_snapshot(&mut self) {
        if let Some(handle) = self.snapshot.take() {
            handle.abort();
        }
    }
}

/// Reset counts on every transition to a state without a session
async fn watch_session(hub: Weak<HubInner>, mut rx: watch::Receiver<SessionState>) {
    while rx.changed().await.is_ok() {
        let ended = rx.borrow_and_update().session().is_none();
        let Some(hub) = hub.upgrade() else {
            return;
        };
        if ended {
            hub.clear_counts();
        }
    }
}

/// Wait for a server-validated session, clearing counts while there is none
async fn next_validated(
    rx: &mut watch::Receiver<SessionState>,
    hub: &HubInner,
    cancel: &CancellationToken,
) -> String {
    loop {
        let token = {
            let state = rx.borrow_and_update();
            if state.session().is_none() {
                hub.end_session(cancel);
            }
            state.validated().map(|s| s.token.clone())
        };
        if let Some(token) = token {
            return token;
        }
        if rx.changed().await.is_err() {
            // SessionManager 已释放，只能等取消
            std::future::pending::<()>().await;
        }
    }
}

/// Resolves once the validated session no longer carries `token`
async fn session_changed(rx: &mut watch::Receiver<SessionState>, token: &str) {
    loop {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
        let same = rx
            .borrow_and_update()
            .validated()
            .is_some_and(|s| s.token == token);
        if !same {
            return;
        }
    }
}

/// Classify an inbound text frame; malformed frames are logged and dropped
fn is_recount(text: &str) -> bool {
    let event = match RealtimeEvent::parse(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                code = %ErrorCode::ProtocolError.api_code(),
                error = %e,
                "Dropping malformed realtime frame"
            );
            return false;
        }
    };

    match event.kind() {
        EventKind::Recount => {
            tracing::debug!(event_type = %event.event_type, "Count-relevant event");
            true
        }
        EventKind::Lifecycle => {
            if event.event_type == "error" {
                tracing::warn!(data = ?event.data, "Realtime server reported an error");
            } else {
                tracing::debug!(event_type = %event.event_type, "Realtime lifecycle event");
            }
            false
        }
        EventKind::Ignored => {
            tracing::trace!(event_type = %event.event_type, "Ignoring realtime event");
            false
        }
    }
}
