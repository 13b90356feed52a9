//! Session-redirect policy.
//!
//! The only place that navigates to the login boundary. It is triggered by
//! the response interceptor when an envelope carries code 401.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

/// Path of the login boundary.
pub const LOGIN_PATH: &str = "/login";

/// Performs the navigation side effect (a router in a UI, a hint in a CLI).
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Default navigator: only logs where the user should go.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        info!(path, "session expired, login required");
    }
}

/// Collapses redundant navigations: once a redirect is pending, further
/// 401s do not navigate again until a successful envelope clears it.
///
/// Only a code-200 envelope clears it. A failed re-login (wrong password,
/// network error) leaves it pending, so later 401s still notify but do not
/// navigate until some call succeeds.
pub struct SessionRedirect {
    navigator: Arc<dyn Navigator>,
    pending: AtomicBool,
}

impl SessionRedirect {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            pending: AtomicBool::new(false),
        }
    }

    /// Navigate to [`LOGIN_PATH`] unless a redirect is already pending.
    /// Returns whether navigation happened.
    pub fn trigger(&self) -> bool {
        if self.pending.swap(true, Ordering::SeqCst) {
            debug!("login redirect already pending");
            return false;
        }
        info!(path = LOGIN_PATH, "redirecting to login");
        self.navigator.navigate(LOGIN_PATH);
        true
    }

    /// The session is valid again.
    pub fn clear(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}
