//! Read-only view of the bracket table.

use axum::extract::State;
use mei_core::BracketConfig;
use serde::Serialize;

use crate::extract::{Json, Path};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BracketListResponse {
    pub years: Vec<i32>,
    pub latest: BracketConfig,
}

#[derive(Debug, Serialize)]
pub struct BracketResponse {
    pub requested_year: i32,
    pub used_fallback: bool,
    pub bracket: BracketConfig,
}

pub async fn list_brackets(State(state): State<AppState>) -> Json<BracketListResponse> {
    Json(BracketListResponse {
        years: state.brackets.years(),
        latest: state.brackets.latest().clone(),
    })
}

/// Unknown years resolve to the latest one, flagged with `used_fallback`.
pub async fn get_bracket(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Json<BracketResponse> {
    let bracket = state.brackets.resolve(year);
    Json(BracketResponse {
        requested_year: year,
        used_fallback: bracket.year != year,
        bracket: bracket.clone(),
    })
}
