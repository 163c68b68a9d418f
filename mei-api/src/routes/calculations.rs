//! Saved calculation history. Saving is the metered action.

use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use mei_core::calculations::usage_period_start;
use mei_core::{CalculationKind, Limit, NewSavedCalculation, SavedCalculation, UsageQuota};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::account::current_usage;
use super::calculators::evaluate;
use crate::error::ApiError;
use crate::extract::{CurrentUser, Json, Path, Query};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveCalculationRequest {
    pub kind: CalculationKind,
    /// Same body the matching calculator endpoint accepts.
    pub input: Value,
}

#[derive(Debug, Serialize)]
pub struct SaveCalculationResponse {
    pub calculation: SavedCalculation,
    pub usage: UsageQuota,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub kind: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub calculations: Vec<SavedCalculation>,
}

/// Computes `input` server-side and records it with its result.
///
/// Invalid input is rejected before the quota is touched. For metered plans
/// the final count-and-insert is a single reservation, so the stored count
/// never exceeds the limit.
pub async fn save_calculation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<SaveCalculationRequest>,
) -> Result<(StatusCode, Json<SaveCalculationResponse>), ApiError> {
    let result = evaluate(&state.brackets, req.kind, req.input.clone())?;

    let since = usage_period_start(Utc::now());
    let new = NewSavedCalculation {
        user_id: user.id.clone(),
        kind: req.kind,
        input: req.input,
        result,
    };

    let saved = match state.quota.limit_for(user.plan) {
        Limit::Unlimited => state.repo.create_calculation(new).await?,
        Limit::Count(limit) => {
            let used = state.repo.count_calculations_since(&user.id, since).await?;
            if !state.quota.check(user.plan, used).allowed {
                warn!(user_id = %user.id, used, limit, "quota exceeded");
                return Err(ApiError::quota_exceeded(state.quota.quota(user.plan, used)));
            }

            match state.repo.reserve_calculation(new, since, limit).await? {
                Some(saved) => saved,
                None => {
                    warn!(user_id = %user.id, limit, "quota reached by a concurrent save");
                    return Err(ApiError::quota_exceeded(state.quota.quota(user.plan, limit)));
                }
            }
        }
    };

    info!(
        user_id = %user.id,
        id = saved.id,
        kind = saved.kind.as_str(),
        "saved calculation"
    );

    let usage = current_usage(&state, &user).await?;
    Ok((
        StatusCode::CREATED,
        Json(SaveCalculationResponse {
            calculation: saved,
            usage,
        }),
    ))
}

/// Newest first, optionally filtered with `?kind=`.
pub async fn list_calculations(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let kind = match query.kind.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(CalculationKind::parse(raw).ok_or_else(|| {
            ApiError::bad_request(format!("unknown calculation kind '{raw}'"))
                .with_code("invalid_input")
        })?),
    };

    let calculations = state.repo.list_calculations(&user.id, kind).await?;
    Ok(Json(ListResponse { calculations }))
}

pub async fn get_calculation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<SavedCalculation>, ApiError> {
    let calculation = state.repo.get_calculation(&user.id, id).await?;
    Ok(Json(calculation))
}

/// Usage is counted from stored records, so deleting one saved this month
/// frees a unit of this month's quota.
pub async fn delete_calculation(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.repo.delete_calculation(&user.id, id).await?;
    info!(user_id = %user.id, id, "deleted calculation");
    Ok(StatusCode::NO_CONTENT)
}

