// ============================
// guard-lib/src/handlers/admin.rs
// ============================
//! Administrative re-arm endpoints.
use crate::admin::{Actor, ReactivationAction, REARM_ACTION};
use crate::error::AppError;
use crate::store::TimestampStore;
use crate::{AppState, CurrentUser};
use axum::{
    extract::State,
    response::Redirect,
    Extension, Form, Json,
};
use passguard_common::RearmForm;
use serde::Deserialize;
use std::sync::Arc;

/// The re-arm form view: issues the one-time anti-forgery nonce the POST
/// must echo back. Admin only, so nonces are never handed to regular users.
pub async fn rearm_form<S: TimestampStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<CurrentUser>>,
) -> Result<Json<RearmForm>, AppError> {
    let Some(Extension(user)) = user else {
        return Err(AppError::Forbidden);
    };
    if !user.is_admin {
        return Err(AppError::Forbidden);
    }

    let nonce = state.nonces.issue(REARM_ACTION);
    Ok(Json(RearmForm { nonce }))
}

/// Body of the re-arm POST.
#[derive(Deserialize, Debug)]
pub struct RearmRequest {
    pub nonce: String,
}

/// Re-arm the rotation requirement, then redirect to the confirmation view.
pub async fn rearm<S: TimestampStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    user: Option<Extension<CurrentUser>>,
    Form(body): Form<RearmRequest>,
) -> Result<Redirect, AppError> {
    let Some(Extension(user)) = user else {
        return Err(AppError::Forbidden);
    };

    let actor = Actor {
        id: user.id,
        is_admin: user.is_admin,
    };

    let action = ReactivationAction::new(state.clock.clone());
    action.execute(&actor, &state.nonces, &body.nonce).await?;

    let target = format!("{}?forced=1", state.settings.routes.admin_rearm);
    Ok(Redirect::to(&target))
}
