// ============================
// guard-lib/src/rotation.rs
// ============================
//! Rotation decisions: the global activation watermark vs. per-user
//! last-changed stamps.
//!
//! Only two scalars exist per decision, so there is no cached "must rotate"
//! flag to invalidate: every call recomputes the comparison, which
//! self-heals whenever an administrator re-arms the requirement.
use crate::error::AppError;
use crate::store::TimestampStore;
use metrics::counter;
use passguard_common::{UnixSeconds, UserId};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of "now", injectable for tests.
pub trait TimeSource: Send + Sync {
    fn now_secs(&self) -> UnixSeconds;
}

/// Wall-clock time source used in production.
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> UnixSeconds {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as UnixSeconds)
            .unwrap_or(0)
    }
}

/// Rotation clock over a timestamp store and a time source.
pub struct RotationClock<S> {
    store: Arc<S>,
    time: Arc<dyn TimeSource>,
}

impl<S> Clone for RotationClock<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            time: Arc::clone(&self.time),
        }
    }
}

impl<S: TimestampStore> RotationClock<S> {
    pub fn new(store: Arc<S>, time: Arc<dyn TimeSource>) -> Self {
        Self { store, time }
    }

    /// Clock on the system wall clock.
    pub fn with_system_time(store: Arc<S>) -> Self {
        Self::new(store, Arc::new(SystemTimeSource))
    }

    /// Whether the user must change their password before continuing.
    ///
    /// True iff the requirement has ever been armed and the user has not
    /// changed their password at or after the current watermark. A user
    /// with no recorded change is always stale once armed.
    pub async fn is_rotation_required(&self, user: &UserId) -> Result<bool, AppError> {
        let activated_at = self.store.activation().await?;
        if activated_at <= 0 {
            return Ok(false);
        }

        let changed_at = self.store.user_changed_at(user).await?;
        if changed_at <= 0 {
            return Ok(true);
        }

        Ok(changed_at < activated_at)
    }

    /// Stamp the user's record with the current time.
    ///
    /// Call exactly once per successful, validated password change (and on
    /// registration, where the freshly chosen password is by definition
    /// current). Never call it on failed attempts or blank password fields.
    pub async fn record_password_changed(&self, user: &UserId) -> Result<(), AppError> {
        let now = self.time.now_secs();
        self.store.set_user_changed_at(user, now).await?;
        counter!("rotation.password_changed").increment(1);
        tracing::debug!(user = %user, at = now, "recorded password change");
        Ok(())
    }

    /// Move the global watermark to the current time, re-requiring rotation
    /// for everyone who changed before it. Repeated calls simply move the
    /// watermark forward.
    pub async fn arm_rotation_requirement(&self) -> Result<(), AppError> {
        let now = self.time.now_secs();
        self.store.set_activation(now).await?;
        counter!("rotation.armed").increment(1);
        tracing::info!(at = now, "rotation requirement armed");
        Ok(())
    }

    /// First-run activation: arm once if the watermark has never been set.
    /// Subsequent starts leave an existing watermark alone.
    pub async fn arm_if_unarmed(&self) -> Result<(), AppError> {
        if self.store.activation().await? <= 0 {
            self.arm_rotation_requirement().await?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FixedTime;
    use super::*;
    use crate::store::MemoryStore;

    fn clock_at(secs: UnixSeconds) -> (RotationClock<MemoryStore>, Arc<FixedTime>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let time = FixedTime::at(secs);
        let clock = RotationClock::new(Arc::clone(&store), time.clone());
        (clock, time, store)
    }

    #[tokio::test]
    async fn unarmed_watermark_requires_nothing() {
        let (clock, _, _) = clock_at(1000);
        let user = UserId::from("alice");
        assert!(!clock.is_rotation_required(&user).await.unwrap());
    }

    #[tokio::test]
    async fn armed_watermark_requires_rotation_from_unstamped_users() {
        let (clock, _, _) = clock_at(1000);
        let user = UserId::from("alice");

        clock.arm_rotation_requirement().await.unwrap();
        assert!(clock.is_rotation_required(&user).await.unwrap());
    }

    #[tokio::test]
    async fn change_at_or_after_watermark_clears_the_requirement() {
        let (clock, _, store) = clock_at(1000);
        let user = UserId::from("alice");
        clock.arm_rotation_requirement().await.unwrap();

        // change exactly at the watermark counts as fresh
        store.set_user_changed_at(&user, 1000).await.unwrap();
        assert!(!clock.is_rotation_required(&user).await.unwrap());

        store.set_user_changed_at(&user, 999).await.unwrap();
        assert!(clock.is_rotation_required(&user).await.unwrap());
    }

    #[tokio::test]
    async fn record_then_check_is_always_fresh() {
        let (clock, time, _) = clock_at(1000);
        let user = UserId::from("alice");

        clock.arm_rotation_requirement().await.unwrap();
        time.set(1500);
        clock.record_password_changed(&user).await.unwrap();
        assert!(!clock.is_rotation_required(&user).await.unwrap());
    }

    #[tokio::test]
    async fn rearm_scenario_watermark_moves_forward() {
        // watermark=1000, user changed at 500 -> required
        let (clock, time, store) = clock_at(1000);
        let user = UserId::from("alice");
        clock.arm_rotation_requirement().await.unwrap();
        store.set_user_changed_at(&user, 500).await.unwrap();
        assert!(clock.is_rotation_required(&user).await.unwrap());

        // user changes at 2000 -> no longer required
        time.set(2000);
        clock.record_password_changed(&user).await.unwrap();
        assert!(!clock.is_rotation_required(&user).await.unwrap());

        // admin re-arms at 3000 -> required again
        time.set(3000);
        clock.arm_rotation_requirement().await.unwrap();
        assert!(clock.is_rotation_required(&user).await.unwrap());
    }

    #[tokio::test]
    async fn users_are_independent() {
        let (clock, time, _) = clock_at(1000);
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        clock.arm_rotation_requirement().await.unwrap();
        time.set(2000);
        clock.record_password_changed(&alice).await.unwrap();

        assert!(!clock.is_rotation_required(&alice).await.unwrap());
        assert!(clock.is_rotation_required(&bob).await.unwrap());
    }

    #[tokio::test]
    async fn arm_if_unarmed_arms_only_once() {
        let (clock, time, store) = clock_at(1000);

        clock.arm_if_unarmed().await.unwrap();
        assert_eq!(store.activation().await.unwrap(), 1000);

        time.set(2000);
        clock.arm_if_unarmed().await.unwrap();
        assert_eq!(store.activation().await.unwrap(), 1000);
    }
}
