//! Notification state store
//!
//! Counts are only ever replaced by a full server snapshot. Each fetch takes
//! a [`RefreshTicket`] first; `reset` (logout) and `invalidate` (unmount)
//! void every outstanding ticket so a late response cannot repopulate
//! cleared counts.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use shared::NotificationCounts;
use tokio::sync::watch;

/// Proof that a snapshot was requested under the current store generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct RefreshTicket {
    generation: u64,
}

#[derive(Debug)]
pub struct NotificationStore {
    counts: watch::Sender<NotificationCounts>,
    generation: AtomicU64,
    // 串行化 apply 与 reset
    write_lock: Mutex<()>,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    pub fn new() -> Self {
        let (counts, _) = watch::channel(NotificationCounts::default());
        Self {
            counts,
            generation: AtomicU64::new(0),
            write_lock: Mutex::new(()),
        }
    }

    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket {
            generation: self.generation.load(Ordering::Acquire),
        }
    }

    /// Replace the counts wholesale; `false` if the ticket is stale
    pub fn apply(&self, ticket: RefreshTicket, counts: NotificationCounts) -> bool {
        let _guard = self.write_lock.lock();
        if ticket.generation != self.generation.load(Ordering::Acquire) {
            tracing::debug!("Dropping stale notification snapshot");
            return false;
        }
        self.counts.send_replace(counts);
        true
    }

    /// Invalidate outstanding tickets, keeping the current counts
    pub fn invalidate(&self) {
        let _guard = self.write_lock.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Zero the counts and invalidate outstanding tickets
    pub fn reset(&self) {
        let _guard = self.write_lock.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.counts.send_replace(NotificationCounts::default());
    }

    pub fn counts(&self) -> NotificationCounts {
        *self.counts.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationCounts> {
        self.counts.subscribe()
    }
}
