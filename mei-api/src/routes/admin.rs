//! Operator endpoints, guarded by the admin bearer token.

use axum::extract::State;
use mei_core::{NewUser, Plan, User};
use serde::Deserialize;
use tracing::info;

use crate::error::ApiError;
use crate::extract::{Json, Path, RequireAdmin};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SetPlanRequest {
    pub plan: Plan,
}

/// Sets a user's plan, provisioning the user if it has never called the API.
/// This is how billing webhooks upgrade and downgrade accounts.
pub async fn set_user_plan(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<SetPlanRequest>,
) -> Result<Json<User>, ApiError> {
    state
        .repo
        .upsert_user(NewUser {
            id: user_id.clone(),
            email: None,
            plan: req.plan,
        })
        .await?;
    let user = state.repo.set_user_plan(&user_id, req.plan).await?;

    info!(user_id = %user.id, plan = %user.plan, "plan updated");
    Ok(Json(user))
}
