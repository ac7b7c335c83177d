// ============================
// guard-lib/src/handlers/rotation.rs
// ============================
//! Password change, rotation status, and the profile view.
use crate::error::AppError;
use crate::policy::{evaluate_password, password_hint};
use crate::store::TimestampStore;
use crate::{AppState, CurrentUser};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use metrics::counter;
use passguard_common::{
    ChangePasswordRequest, PromptDecision, RequestClass, RequestContext, RotationStatus,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Change the current user's password.
///
/// The upstream required-field check lives here: a blank password is a bad
/// request, not a policy violation (the policy itself reports nothing for
/// empty input). On success the change is stamped, which clears any pending
/// rotation requirement for this user.
pub async fn change_password<S: TimestampStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<CurrentUser>>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    let Some(Extension(user)) = user else {
        return Err(AppError::Forbidden);
    };

    if body.password.is_empty() {
        return Err(AppError::InvalidInput("password is required".to_string()));
    }

    let violations = evaluate_password(&body.password, &state.settings.password_requirements);
    if !violations.is_empty() {
        counter!("password.rejected").increment(1);
        tracing::debug!(user = %user.id, count = violations.len(), "password rejected");
        return Err(AppError::Validation(violations));
    }

    // The host's credential store performs the actual update; this hook
    // only stamps the change time.
    state.clock.record_password_changed(&user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Whether the current user is required to rotate.
pub async fn rotation_status<S: TimestampStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<RotationStatus>, AppError> {
    let Some(Extension(user)) = user else {
        return Err(AppError::Forbidden);
    };

    let rotation_required = state.clock.is_rotation_required(&user.id).await?;
    Ok(Json(RotationStatus { rotation_required }))
}

/// Response body of the profile view.
#[derive(serde::Serialize, Deserialize, Debug)]
pub struct ProfileView {
    #[serde(flatten)]
    pub prompt: PromptDecision,
    pub password_hint: String,
}

/// The profile page: the one interactive page a blocked user is allowed to
/// reach. Reports whether the force-change prompt should be rendered on
/// this particular load, plus the hint to show next to the password fields.
pub async fn profile_view<S: TimestampStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<CurrentUser>>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ProfileView>, AppError> {
    let ctx = RequestContext {
        user: user.map(|Extension(u)| u.id),
        route: state.settings.routes.profile.clone(),
        class: RequestClass::InteractivePage,
        marker_present: query.contains_key(crate::config::FORCE_CHANGE_MARKER),
    };

    let show_prompt = state.gate.should_show_prompt(&ctx).await?;
    Ok(Json(ProfileView {
        prompt: PromptDecision { show_prompt },
        password_hint: password_hint(state.settings.password_requirements.min_length),
    }))
}
