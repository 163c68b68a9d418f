//! Stateless calculator endpoints.
//!
//! Each request type here is also the `input` of a saved calculation of the
//! matching kind; [`evaluate`] runs one from raw JSON.

use axum::extract::State;
use chrono::{Datelike, Utc};
use mei_core::CalculationKind;
use mei_core::calculations::{
    Activity, BracketTable, CalculationResult, DasCalculator, HourlyRateInput,
    HourlyRateResult, MarginResult, MonthlyGuide, RevenueLimitCheck, SuggestedPrice,
    hourly_rate, margin, monthly_guide, revenue_limit,
};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::extract::Json;
use crate::state::AppState;

fn current_year() -> i32 {
    Utc::now().year()
}

fn full_year() -> u32 {
    12
}

#[derive(Debug, Clone, Deserialize)]
pub struct DasRequest {
    pub revenue: Decimal,
    /// `I`, `III` or `V`.
    pub annex: String,
    /// Defaults to the current year.
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonthlyGuideRequest {
    pub activity: Activity,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevenueLimitRequest {
    pub annual_revenue: Decimal,
    #[serde(default = "full_year")]
    pub months_active: u32,
    pub year: Option<i32>,
}

/// With `target_margin` the response is a suggested price for `cost`;
/// otherwise `price` is required and the margin of that sale is reported.
#[derive(Debug, Clone, Deserialize)]
pub struct MarginRequest {
    pub cost: Decimal,
    pub price: Option<Decimal>,
    pub target_margin: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MarginResponse {
    Margin(MarginResult),
    SuggestedPrice(SuggestedPrice),
}

pub fn compute_das(
    table: &BracketTable,
    req: DasRequest,
) -> Result<CalculationResult, ApiError> {
    let year = req.year.unwrap_or_else(current_year);
    Ok(DasCalculator::new(table).compute_tagged(req.revenue, &req.annex, year)?)
}

pub fn compute_monthly_guide(
    table: &BracketTable,
    req: MonthlyGuideRequest,
) -> MonthlyGuide {
    monthly_guide::compute(table, req.activity, req.year.unwrap_or_else(current_year))
}

pub fn compute_revenue_limit(
    table: &BracketTable,
    req: RevenueLimitRequest,
) -> Result<RevenueLimitCheck, ApiError> {
    let year = req.year.unwrap_or_else(current_year);
    Ok(revenue_limit::check(table, req.annual_revenue, req.months_active, year)?)
}

pub fn compute_margin(req: MarginRequest) -> Result<MarginResponse, ApiError> {
    match (req.target_margin, req.price) {
        (Some(target), _) => Ok(MarginResponse::SuggestedPrice(margin::suggested_price(
            req.cost, target,
        )?)),
        (None, Some(price)) => Ok(MarginResponse::Margin(margin::compute(price, req.cost)?)),
        (None, None) => Err(ApiError::bad_request("either price or target_margin is required")
            .with_code("invalid_input")),
    }
}

pub fn compute_hourly_rate(req: HourlyRateInput) -> Result<HourlyRateResult, ApiError> {
    Ok(hourly_rate::compute(&req)?)
}

/// Runs the calculator for `kind` on a raw JSON `input` and returns its
/// result as JSON.
pub fn evaluate(
    table: &BracketTable,
    kind: CalculationKind,
    input: Value,
) -> Result<Value, ApiError> {
    fn parse<T: DeserializeOwned>(
        kind: CalculationKind,
        input: Value,
    ) -> Result<T, ApiError> {
        serde_json::from_value(input).map_err(|e| {
            ApiError::bad_request(format!("invalid input for {}: {e}", kind.as_str()))
                .with_code("invalid_input")
        })
    }

    match kind {
        CalculationKind::Das => to_json(compute_das(table, parse(kind, input)?)?),
        CalculationKind::MonthlyGuide => {
            to_json(compute_monthly_guide(table, parse(kind, input)?))
        }
        CalculationKind::RevenueLimit => {
            to_json(compute_revenue_limit(table, parse(kind, input)?)?)
        }
        CalculationKind::Margin => to_json(compute_margin(parse(kind, input)?)?),
        CalculationKind::HourlyRate => to_json(compute_hourly_rate(parse(kind, input)?)?),
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("failed to encode result: {e}")))
}

// ─── handlers ────────────────────────────────────────────────────────────────

pub async fn das_handler(
    State(state): State<AppState>,
    Json(req): Json<DasRequest>,
) -> Result<Json<CalculationResult>, ApiError> {
    compute_das(&state.brackets, req).map(Json)
}

pub async fn monthly_guide_handler(
    State(state): State<AppState>,
    Json(req): Json<MonthlyGuideRequest>,
) -> Json<MonthlyGuide> {
    Json(compute_monthly_guide(&state.brackets, req))
}

pub async fn revenue_limit_handler(
    State(state): State<AppState>,
    Json(req): Json<RevenueLimitRequest>,
) -> Result<Json<RevenueLimitCheck>, ApiError> {
    compute_revenue_limit(&state.brackets, req).map(Json)
}

pub async fn margin_handler(
    Json(req): Json<MarginRequest>,
) -> Result<Json<MarginResponse>, ApiError> {
    compute_margin(req).map(Json)
}

pub async fn hourly_rate_handler(
    Json(req): Json<HourlyRateInput>,
) -> Result<Json<HourlyRateResult>, ApiError> {
    compute_hourly_rate(req).map(Json)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    fn table() -> &'static BracketTable {
        BracketTable::builtin()
    }

    #[test]
    fn evaluate_das_returns_result_json() {
        let value = evaluate(
            table(),
            CalculationKind::Das,
            json!({"revenue": 5000, "annex": "III", "year": 2025}),
        )
        .unwrap();

        assert_eq!(value["tax_due"], json!("224.50"));
        assert_eq!(value["annex"], json!("III"));
    }

    #[test]
    fn evaluate_rejects_unknown_annex_as_bad_request() {
        let err = evaluate(
            table(),
            CalculationKind::Das,
            json!({"revenue": 5000, "annex": "II", "year": 2025}),
        )
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn evaluate_rejects_input_of_wrong_shape() {
        let err = evaluate(table(), CalculationKind::Margin, json!({"price": 10})).unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.response.error.code.as_deref(), Some("invalid_input"));
    }

    #[test]
    fn evaluate_monthly_guide() {
        let value = evaluate(
            table(),
            CalculationKind::MonthlyGuide,
            json!({"activity": "commerce_and_services", "year": 2025}),
        )
        .unwrap();

        assert_eq!(value["total"], json!("81.90"));
    }

    #[test]
    fn revenue_limit_defaults_to_full_year() {
        let req: RevenueLimitRequest =
            serde_json::from_value(json!({"annual_revenue": "40000", "year": 2025})).unwrap();

        let check = compute_revenue_limit(table(), req).unwrap();

        assert_eq!(check.months_active, 12);
        assert_eq!(check.ceiling, dec!(81000.00));
    }

    #[test]
    fn margin_prefers_target_margin() {
        let response = compute_margin(MarginRequest {
            cost: dec!(60),
            price: Some(dec!(90)),
            target_margin: Some(dec!(0.4)),
        })
        .unwrap();

        match response {
            MarginResponse::SuggestedPrice(suggested) => assert_eq!(suggested.price, dec!(100.00)),
            other => panic!("expected suggested price, got {other:?}"),
        }
    }

    #[test]
    fn margin_without_price_or_target_is_rejected() {
        let err = compute_margin(MarginRequest {
            cost: dec!(60),
            price: None,
            target_margin: None,
        })
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
