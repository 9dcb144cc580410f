//! Access guards for protected regions and routes
//!
//! Every decision goes through [`PermissionEvaluator`]; nothing here compares
//! role strings. Decisions are advisory: the server re-checks critical
//! modules on each mutating request.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use shared::{CapabilitySet, ErrorCode, Module, PermissionEvaluator, Role};

use crate::session::{SessionManager, SessionState};

/// Default login route
pub const DEFAULT_LOGIN_PATH: &str = "/admin/login";

/// Denial naming what was asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    pub module: String,
    pub action: String,
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Access denied: {} on {}", self.action, self.module)
    }
}

/// Outcome of a permission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Session not resolved yet, show a neutral placeholder
    Checking,
    Granted,
    Denied(AccessDenied),
}

impl Access {
    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted)
    }
}

/// What a guarded region shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    Checking,
    Protected(T),
    Fallback(T),
    Denied(AccessDenied),
}

/// Gate for a protected region (module, action)
#[derive(Debug, Clone)]
pub struct AccessGuard {
    session: Arc<SessionManager>,
    evaluator: PermissionEvaluator,
}

impl AccessGuard {
    pub fn new(session: Arc<SessionManager>, evaluator: PermissionEvaluator) -> Self {
        Self { session, evaluator }
    }

    pub fn evaluator(&self) -> &PermissionEvaluator {
        &self.evaluator
    }

    /// Check against the live session
    pub fn check(&self, module: &str, action: &str) -> Access {
        self.evaluate(&self.session.state(), module, action)
    }

    /// Check against a given session state
    ///
    /// A provisional session is trusted for ordinary modules but critical
    /// modules stay `Checking` until the server confirms it.
    pub fn evaluate(&self, state: &SessionState, module: &str, action: &str) -> Access {
        let user = match state {
            SessionState::Loading => return Access::Checking,
            SessionState::Anonymous => return Self::denied(module, action),
            SessionState::Provisional(session) => {
                if Module::parse(module).is_some_and(|m| m.is_critical()) {
                    return Access::Checking;
                }
                &session.user
            }
            SessionState::Authenticated(session) => &session.user,
        };

        if self.evaluator.check(user, module, action) {
            Access::Granted
        } else {
            Self::denied(module, action)
        }
    }

    pub fn can(&self, module: &str, action: &str) -> bool {
        self.check(module, action).is_granted()
    }

    /// Render `protected` when granted, otherwise the access-denied indicator
    pub fn render<T>(&self, module: &str, action: &str, protected: impl FnOnce() -> T) -> Rendered<T> {
        match self.check(module, action) {
            Access::Checking => Rendered::Checking,
            Access::Granted => Rendered::Protected(protected()),
            Access::Denied(denied) => Rendered::Denied(denied),
        }
    }

    /// Like [`render`](Self::render), showing `fallback` instead of the denial
    pub fn render_or<T>(
        &self,
        module: &str,
        action: &str,
        protected: impl FnOnce() -> T,
        fallback: impl FnOnce() -> T,
    ) -> Rendered<T> {
        match self.check(module, action) {
            Access::Checking => Rendered::Checking,
            Access::Granted => Rendered::Protected(protected()),
            Access::Denied(_) => Rendered::Fallback(fallback()),
        }
    }

    /// Capabilities of the validated user, `None` until the server confirmed the session
    pub fn capabilities(&self) -> Option<CapabilitySet> {
        self.session
            .state()
            .validated()
            .map(|s| self.evaluator.capabilities(&s.user))
    }

    fn denied(module: &str, action: &str) -> Access {
        Access::Denied(AccessDenied {
            module: module.to_string(),
            action: action.to_string(),
        })
    }
}

/// Host navigation hooks
pub trait Navigator {
    fn current_path(&self) -> String;
    fn redirect(&self, path: &str);
}

/// Route-level decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Checking,
    Allow,
    /// Not signed in, send to the login route
    Redirect(String),
    /// Not signed in but already on the login route
    OnLoginRoute,
    RoleMismatch { expected: Role, actual: String },
}

impl RouteDecision {
    /// Error code for a decision that blocks the route
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            RouteDecision::Redirect(_) | RouteDecision::OnLoginRoute => {
                Some(ErrorCode::NotAuthenticated)
            }
            RouteDecision::RoleMismatch { .. } => Some(ErrorCode::RoleRequired),
            RouteDecision::Checking | RouteDecision::Allow => None,
        }
    }
}

/// Gate for a whole route, optionally restricted to one role
#[derive(Debug)]
pub struct RouteGuard {
    session: Arc<SessionManager>,
    login_path: String,
    required_role: Option<Role>,
    redirected: AtomicBool,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            session,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            required_role: None,
            redirected: AtomicBool::new(false),
        }
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn require_role(mut self, role: Role) -> Self {
        self.required_role = Some(role);
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Pure decision for a state and the current location
    ///
    /// Role-gated routes wait for server confirmation of a provisional session.
    pub fn decide(&self, state: &SessionState, current_path: &str) -> RouteDecision {
        let session = match state {
            SessionState::Loading => return RouteDecision::Checking,
            SessionState::Anonymous => {
                return if self.is_login_route(current_path) {
                    RouteDecision::OnLoginRoute
                } else {
                    RouteDecision::Redirect(self.login_path.clone())
                };
            }
            SessionState::Provisional(_) if self.required_role.is_some() => {
                return RouteDecision::Checking;
            }
            SessionState::Provisional(session) | SessionState::Authenticated(session) => session,
        };

        match self.required_role {
            Some(expected) if session.role() != Some(expected) => RouteDecision::RoleMismatch {
                expected,
                actual: session.user.role.clone(),
            },
            _ => RouteDecision::Allow,
        }
    }

    /// Decide for the live session and perform the redirect, at most once
    /// until the user gets through again
    pub fn enforce(&self, navigator: &dyn Navigator) -> RouteDecision {
        let decision = self.decide(&self.session.state(), &navigator.current_path());
        match &decision {
            RouteDecision::Redirect(path) => {
                if !self.redirected.swap(true, Ordering::AcqRel) {
                    tracing::debug!(to = %path, "Redirecting to login");
                    navigator.redirect(path);
                }
            }
            RouteDecision::Allow => self.redirected.store(false, Ordering::Release),
            RouteDecision::RoleMismatch { expected, actual } => {
                tracing::warn!(
                    code = %ErrorCode::RoleRequired.api_code(),
                    expected = %expected,
                    actual = %actual,
                    "Route requires a different role"
                );
            }
            RouteDecision::Checking | RouteDecision::OnLoginRoute => {}
        }
        decision
    }

    fn is_login_route(&self, path: &str) -> bool {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        path.trim_end_matches('/') == self.login_path.trim_end_matches('/')
    }
}
