//! The caller's own account: profile, metered usage and badges.

use std::collections::BTreeSet;

use axum::extract::State;
use chrono::Utc;
use mei_core::calculations::{Badge, UsageStats, badges, usage_period_start};
use mei_core::{CalculationKind, UsageQuota, User};
use serde::Serialize;

use crate::error::ApiError;
use crate::extract::{CurrentUser, Json};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
    pub usage: UsageQuota,
}

#[derive(Debug, Serialize)]
pub struct BadgeEntry {
    pub badge: Badge,
    pub title: &'static str,
}

#[derive(Debug, Serialize)]
pub struct BadgesResponse {
    pub total_calculations: u32,
    pub kinds_used: BTreeSet<CalculationKind>,
    pub badges: Vec<BadgeEntry>,
}

/// Usage of `user` in the current metering period.
pub(crate) async fn current_usage(
    state: &AppState,
    user: &User,
) -> Result<UsageQuota, ApiError> {
    let since = usage_period_start(Utc::now());
    let used = state.repo.count_calculations_since(&user.id, since).await?;
    Ok(state.quota.quota(user.plan, used))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<MeResponse>, ApiError> {
    let usage = current_usage(&state, &user).await?;
    Ok(Json(MeResponse { user, usage }))
}

pub async fn usage(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<UsageQuota>, ApiError> {
    current_usage(&state, &user).await.map(Json)
}

pub async fn list_badges(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<BadgesResponse>, ApiError> {
    let by_kind = state.repo.count_calculations_by_kind(&user.id).await?;

    let stats = UsageStats {
        total_calculations: by_kind.iter().map(|(_, n)| n).sum(),
        kinds_used: by_kind
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(kind, _)| *kind)
            .collect(),
        plan: user.plan,
    };

    let badges = badges::earned(&stats)
        .into_iter()
        .map(|badge| BadgeEntry {
            badge,
            title: badge.title(),
        })
        .collect();

    Ok(Json(BadgesResponse {
        total_calculations: stats.total_calculations,
        kinds_used: stats.kinds_used,
        badges,
    }))
}
