// ============================
// guard-lib/src/lib.rs
// ============================
//! Core `PassGuard` functionality: password-strength policy, forced
//! rotation decisions, and the axum host adapter around them.

pub mod admin;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod policy;
pub mod rotation;
pub mod router;
pub mod store;
pub mod token;

use crate::admin::NonceStore;
use crate::config::Settings;
use crate::gate::ForceChangeGate;
use crate::rotation::{RotationClock, SystemTimeSource, TimeSource};
use crate::store::TimestampStore;
use passguard_common::UserId;
use std::sync::Arc;
use std::time::Duration;

/// Authenticated request identity, inserted as a request extension by the
/// host's auth layer before the force-change middleware runs.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: UserId,
    pub is_admin: bool,
}

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Rotation clock over the injected store
    pub clock: RotationClock<S>,
    /// Per-request gate
    pub gate: ForceChangeGate<S>,
    /// Anti-forgery nonces for the admin action
    pub nonces: Arc<NonceStore>,
    /// Settings
    pub settings: Arc<Settings>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            clock: self.clock.clone(),
            gate: self.gate.clone(),
            nonces: Arc::clone(&self.nonces),
            settings: Arc::clone(&self.settings),
        }
    }
}

impl<S: TimestampStore> AppState<S> {
    /// Create a new application state on the system clock
    pub fn new(store: S, settings: Settings) -> Self {
        Self::with_time_source(store, settings, Arc::new(SystemTimeSource))
    }

    /// Create a new application state with an injected time source
    pub fn with_time_source(store: S, settings: Settings, time: Arc<dyn TimeSource>) -> Self {
        let store = Arc::new(store);
        let clock = RotationClock::new(store, time);
        let gate = ForceChangeGate::new(clock.clone(), settings.routes.clone());
        let nonces = Arc::new(NonceStore::new(Duration::from_secs(settings.nonce_ttl_secs)));

        Self {
            clock,
            gate,
            nonces,
            settings: Arc::new(settings),
        }
    }
}
