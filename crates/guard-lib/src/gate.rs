// ============================
// guard-lib/src/gate.rs
// ============================
//! Per-request block/allow and prompt decisions.
//!
//! The gate only decides; the redirect side effect belongs to the host (for
//! the bundled axum host, `middleware::force_change`). That keeps both
//! decisions testable without a running request pipeline.
use crate::config::RouteTable;
use crate::error::AppError;
use crate::rotation::RotationClock;
use crate::store::TimestampStore;
use metrics::counter;
use passguard_common::{RequestClass, RequestContext};

/// Decision point consulted on every request that can be gated.
pub struct ForceChangeGate<S> {
    clock: RotationClock<S>,
    routes: RouteTable,
}

impl<S> Clone for ForceChangeGate<S> {
    fn clone(&self) -> Self {
        Self {
            clock: self.clock.clone(),
            routes: self.routes.clone(),
        }
    }
}

impl<S: TimestampStore> ForceChangeGate<S> {
    pub fn new(clock: RotationClock<S>, routes: RouteTable) -> Self {
        Self { clock, routes }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Whether this request must be answered with a redirect to the profile
    /// page instead of being processed.
    ///
    /// Anonymous requests and programmatic requests are never blocked;
    /// neither are the allow-listed routes (the profile page itself, the
    /// login page, and the background-action endpoints).
    pub async fn should_block(&self, ctx: &RequestContext) -> Result<bool, AppError> {
        let Some(user) = &ctx.user else {
            return Ok(false);
        };

        // Programmatic clients are exempt outright, before the route is
        // even looked at; redirect-looping an API caller breaks it.
        if ctx.class == RequestClass::BackgroundOrProgrammatic {
            return Ok(false);
        }

        if self.routes.is_allowed(&ctx.route) {
            return Ok(false);
        }

        if !self.clock.is_rotation_required(user).await? {
            return Ok(false);
        }

        counter!("gate.blocked").increment(1);
        tracing::debug!(user = %user, route = %ctx.route, "blocking request, rotation required");
        Ok(true)
    }

    /// Whether the force-change reminder UI should be rendered on this page
    /// load. Strictly narrower than `should_block`: only on the profile
    /// route, and only when the redirect marker came along in the query.
    pub async fn should_show_prompt(&self, ctx: &RequestContext) -> Result<bool, AppError> {
        let Some(user) = &ctx.user else {
            return Ok(false);
        };

        if !self.clock.is_rotation_required(user).await? {
            return Ok(false);
        }

        if !ctx.marker_present {
            return Ok(false);
        }

        Ok(ctx.route == self.routes.profile)
    }
}
