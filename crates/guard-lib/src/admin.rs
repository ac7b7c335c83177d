// ============================
// guard-lib/src/admin.rs
// ============================
//! Administrative re-arm of the rotation requirement.
//!
//! The only write path for the activation watermark besides first-run
//! activation. Guarded twice: the acting user must hold the administrative
//! capability, and the request must carry a valid one-time anti-forgery
//! nonce issued for this action. Neither failure mutates anything.
use crate::error::AppError;
use crate::rotation::RotationClock;
use crate::store::TimestampStore;
use crate::token::generate_secure_token;
use dashmap::DashMap;
use metrics::counter;
use passguard_common::UserId;
use std::time::{Duration, Instant};

/// Action name the re-arm nonce is scoped to.
pub const REARM_ACTION: &str = "force_password_again";

/// The user attempting an administrative action.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: UserId,
    pub is_admin: bool,
}

impl Actor {
    pub fn admin(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            is_admin: true,
        }
    }

    pub fn regular(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            is_admin: false,
        }
    }
}

struct NonceEntry {
    action: String,
    issued_at: Instant,
}

/// One-time anti-forgery nonces, scoped to an action name and expiring
/// after a TTL. Consuming a nonce removes it, so replays fail.
pub struct NonceStore {
    nonces: DashMap<String, NonceEntry>,
    ttl: Duration,
}

impl NonceStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            nonces: DashMap::new(),
            ttl,
        }
    }

    /// Issue a fresh nonce for `action`.
    ///
    /// Also purges expired entries, so nonces that are never consumed do
    /// not accumulate for the life of the process.
    pub fn issue(&self, action: &str) -> String {
        self.nonces
            .retain(|_, entry| entry.issued_at.elapsed() <= self.ttl);

        let token = generate_secure_token();
        self.nonces.insert(
            token.clone(),
            NonceEntry {
                action: action.to_string(),
                issued_at: Instant::now(),
            },
        );
        token
    }

    /// Consume a nonce. Returns true only for a known, unexpired nonce
    /// issued for the same action; the nonce is removed either way, so a
    /// second attempt with the same token always fails.
    pub fn consume(&self, action: &str, token: &str) -> bool {
        match self.nonces.remove(token) {
            Some((_, entry)) => {
                entry.action == action && entry.issued_at.elapsed() <= self.ttl
            }
            None => false,
        }
    }
}

/// The administrative operation that re-requires rotation for every user
/// who has not changed their password since.
pub struct ReactivationAction<S> {
    clock: RotationClock<S>,
}

impl<S: TimestampStore> ReactivationAction<S> {
    pub fn new(clock: RotationClock<S>) -> Self {
        Self { clock }
    }

    /// Re-arm the rotation requirement.
    ///
    /// Fails with `Forbidden` and leaves the watermark untouched when the
    /// actor lacks the administrative capability or the nonce does not
    /// check out. The capability check runs first, so a non-admin cannot
    /// burn someone else's nonce.
    pub async fn execute(
        &self,
        actor: &Actor,
        nonces: &NonceStore,
        nonce: &str,
    ) -> Result<(), AppError> {
        if !actor.is_admin {
            counter!("rearm.forbidden").increment(1);
            tracing::warn!(user = %actor.id, "re-arm attempted without admin capability");
            return Err(AppError::Forbidden);
        }

        if !nonces.consume(REARM_ACTION, nonce) {
            counter!("rearm.forbidden").increment(1);
            tracing::warn!(user = %actor.id, "re-arm attempted with invalid nonce");
            return Err(AppError::Forbidden);
        }

        self.clock.arm_rotation_requirement().await?;
        tracing::info!(user = %actor.id, "rotation requirement re-armed");
        Ok(())
    }
}
