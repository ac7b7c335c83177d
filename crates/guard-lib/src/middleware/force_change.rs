use crate::config::FORCE_CHANGE_MARKER;
use crate::error::AppError;
use crate::store::TimestampStore;
use crate::{AppState, CurrentUser};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use passguard_common::{RequestClass, RequestContext};
use std::sync::Arc;

/// Force-change middleware.
///
/// Builds the request context the gate expects and, when the gate says
/// block, answers with a redirect to the profile route carrying the
/// force-change marker. Runs before any handler, so no response body is
/// ever produced for a blocked request.
pub async fn force_password_change<S: TimestampStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = request_context(&request);

    if state.gate.should_block(&ctx).await? {
        let target = format!(
            "{}?{}=1",
            state.gate.routes().profile,
            FORCE_CHANGE_MARKER
        );
        return Ok(Redirect::to(&target).into_response());
    }

    Ok(next.run(request).await)
}

/// Derive the gate's context from the raw request.
///
/// The authenticated user comes from a `CurrentUser` extension inserted by
/// the host's auth layer. Classification: `X-Requested-With:
/// XMLHttpRequest` or an `/api/` path means programmatic, everything else
/// is an interactive page load.
pub fn request_context(request: &Request) -> RequestContext {
    let user = request
        .extensions()
        .get::<CurrentUser>()
        .map(|u| u.id.clone());

    let route = request.uri().path().to_string();

    let is_ajax = request
        .headers()
        .get("x-requested-with")
        .and_then(|h| h.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"));
    let class = if is_ajax || route.starts_with("/api/") {
        RequestClass::BackgroundOrProgrammatic
    } else {
        RequestClass::InteractivePage
    };

    let marker_present = request
        .uri()
        .query()
        .is_some_and(|q| q.split('&').any(|pair| {
            pair.strip_prefix(FORCE_CHANGE_MARKER)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('='))
        }));

    RequestContext {
        user,
        route,
        class,
        marker_present,
    }
}
