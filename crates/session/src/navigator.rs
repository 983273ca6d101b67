//! Route tracking and the de-authentication side effect
//!
//! When a session cannot be recovered the client clears the store and sends
//! the user to the sign-up route, unless they are already inside the
//! authentication flow.

use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use crate::constants::{AUTH_ROUTES, SIGN_UP_ROUTE};
use crate::store::TokenStore;

/// Where the user currently is, and a way to send them elsewhere.
pub trait Navigator: Send + Sync {
    /// Path of the current route, e.g. `/dashboard`.
    fn current_path(&self) -> String;

    /// Move to `path`.
    fn navigate(&self, path: &str);
}

/// Whether `path` is part of the authentication flow.
///
/// Trailing slashes are ignored, so `/login/` matches `/login`.
pub fn is_auth_route(path: &str) -> bool {
    let trimmed = match path.trim_end_matches('/') {
        "" => "/",
        p => p,
    };
    AUTH_ROUTES.contains(&trimmed)
}

/// Send the user to the sign-up route unless they are already on an
/// authentication route. Returns whether navigation happened.
pub fn redirect_to_sign_up(navigator: &dyn Navigator) -> bool {
    let current = navigator.current_path();
    if is_auth_route(&current) {
        info!(current = %current, "already on an auth route, not redirecting");
        return false;
    }
    navigator.navigate(SIGN_UP_ROUTE);
    true
}

/// Drop every stored credential and redirect to sign-up.
///
/// A failed clear is logged; the redirect still happens so the caller's
/// error path is never blocked by storage.
pub fn end_session(store: &dyn TokenStore, navigator: &dyn Navigator) -> bool {
    if let Err(e) = store.clear() {
        warn!(error = %e, "failed to clear session");
    }
    redirect_to_sign_up(navigator)
}

/// In-process router state.
///
/// Tracks the current path and every navigation, in order.
#[derive(Debug)]
pub struct Location {
    state: Mutex<LocationState>,
}

#[derive(Debug)]
struct LocationState {
    current: String,
    history: Vec<String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(LocationState {
                current: path.into(),
                history: Vec::new(),
            }),
        }
    }

    /// Paths navigated to so far, oldest first. Does not include the
    /// starting path.
    pub fn history(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .history
            .clone()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for Location {
    fn current_path(&self) -> String {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .current
            .clone()
    }

    fn navigate(&self, path: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        info!(from = %state.current, to = path, "navigating");
        state.current = path.to_owned();
        state.history.push(path.to_owned());
    }
}
