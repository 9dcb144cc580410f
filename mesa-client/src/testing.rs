//! In-process fake backend for unit tests

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::client::{LoginRequest, LoginResponse};
use shared::{NotificationCounts, User};
use tokio::sync::Notify;

use crate::http::{AuthApi, NotificationApi};
use crate::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Network,
    Unauthorized,
}

impl Fault {
    fn error(self) -> ClientError {
        match self {
            Fault::Network => ClientError::Connection("connection refused".into()),
            Fault::Unauthorized => ClientError::Unauthorized("token revoked".into()),
        }
    }
}

/// Holds a call open until the test releases it
#[derive(Debug, Default)]
pub struct Gate {
    hold: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl Gate {
    pub fn hold(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.hold.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    async fn pass(&self) {
        if self.hold.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
    }
}

#[derive(Debug)]
pub struct FakeBackend {
    password: String,
    user: Mutex<User>,
    tokens: Mutex<HashSet<String>>,
    next_token: AtomicU64,
    counts: Mutex<NotificationCounts>,
    me_fault: Mutex<Option<Fault>>,
    logout_fault: Mutex<Option<Fault>>,
    counts_fault: Mutex<Option<Fault>>,
    me_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    count_calls: AtomicUsize,
    pub me_gate: Gate,
    pub counts_gate: Gate,
}

pub fn user(username: &str, role: &str) -> User {
    User {
        id: "42".into(),
        username: username.into(),
        email: None,
        role: role.into(),
        overrides: vec![],
    }
}

impl FakeBackend {
    pub fn new(user: User, password: &str) -> Arc<Self> {
        Arc::new(Self {
            password: password.into(),
            user: Mutex::new(user),
            tokens: Mutex::new(HashSet::new()),
            next_token: AtomicU64::new(1),
            counts: Mutex::new(NotificationCounts::default()),
            me_fault: Mutex::new(None),
            logout_fault: Mutex::new(None),
            counts_fault: Mutex::new(None),
            me_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
            me_gate: Gate::default(),
            counts_gate: Gate::default(),
        })
    }

    pub fn director() -> Arc<Self> {
        Self::new(user("lea", "director"), "secret")
    }

    pub fn user(&self) -> User {
        self.user.lock().clone()
    }

    pub fn set_user(&self, user: User) {
        *self.user.lock() = user;
    }

    pub fn set_counts(&self, counts: NotificationCounts) {
        *self.counts.lock() = counts;
    }

    /// Issue a token without going through login
    pub fn issue_token(&self) -> String {
        let token = format!("tok-{}", self.next_token.fetch_add(1, Ordering::SeqCst));
        self.tokens.lock().insert(token.clone());
        token
    }

    pub fn revoke_all_tokens(&self) {
        self.tokens.lock().clear();
    }

    pub fn fail_me(&self, fault: Option<Fault>) {
        *self.me_fault.lock() = fault;
    }

    pub fn fail_logout(&self, fault: Option<Fault>) {
        *self.logout_fault.lock() = fault;
    }

    pub fn fail_counts(&self, fault: Option<Fault>) {
        *self.counts_fault.lock() = fault;
    }

    pub fn me_calls(&self) -> usize {
        self.me_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    fn check_token(&self, token: &str) -> ClientResult<()> {
        if self.tokens.lock().contains(token) {
            Ok(())
        } else {
            Err(ClientError::Unauthorized("invalid token".into()))
        }
    }
}

#[async_trait]
impl AuthApi for FakeBackend {
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        let user = self.user();
        let identity_ok = request.identity().is_some_and(|id| {
            id == user.username || user.email.as_deref() == Some(id)
        });
        if !identity_ok || request.password != self.password {
            return Err(ClientError::InvalidCredentials);
        }
        Ok(LoginResponse {
            token: self.issue_token(),
            user,
        })
    }

    async fn me(&self, token: &str) -> ClientResult<User> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        self.me_gate.pass().await;
        let fault = *self.me_fault.lock();
        if let Some(fault) = fault {
            return Err(fault.error());
        }
        self.check_token(token)?;
        Ok(self.user())
    }

    async fn logout(&self, token: &str) -> ClientResult<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        let fault = *self.logout_fault.lock();
        if let Some(fault) = fault {
            return Err(fault.error());
        }
        self.tokens.lock().remove(token);
        Ok(())
    }
}

#[async_trait]
impl NotificationApi for FakeBackend {
    async fn notification_counts(&self, token: &str) -> ClientResult<NotificationCounts> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        let fault = *self.counts_fault.lock();
        if let Some(fault) = fault {
            return Err(fault.error());
        }
        self.check_token(token)?;
        // 先取数据再卡住，模拟响应在途
        let counts = *self.counts.lock();
        self.counts_gate.pass().await;
        Ok(counts)
    }
}
