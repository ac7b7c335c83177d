// ============================
// guard-lib/src/router.rs
// ============================
//! HTTP router for the host adapter.
use crate::handlers;
use crate::middleware::force_password_change;
use crate::store::TimestampStore;
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Build the router.
///
/// Route paths come from the settings so the gate's allow-list and the
/// actual routes cannot drift apart. The force-change middleware wraps
/// every route, including the exempt ones; exemption is the gate's call,
/// not the router's.
pub fn create_router<S: TimestampStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let profile = state.settings.routes.profile.clone();
    let admin_rearm = state.settings.routes.admin_rearm.clone();

    Router::new()
        .route(&profile, get(handlers::profile_view::<S>))
        .route("/password/change", post(handlers::change_password::<S>))
        .route("/rotation/status", get(handlers::rotation_status::<S>))
        .route(
            &admin_rearm,
            get(handlers::rearm_form::<S>).post(handlers::rearm::<S>),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            force_password_change::<S>,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
