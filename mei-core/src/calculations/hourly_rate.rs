//! Hourly rate a freelancer needs to charge to reach a monthly income.
//!
//! ```text
//! billable_hours = hours_per_day × days_per_week × (52 − vacation_weeks) / 12
//! hourly_rate    = (desired_income + monthly_costs) / billable_hours
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::CalculationError;
use super::common::{ensure_non_negative, in_range, round_half_up};

const WEEKS_PER_YEAR: u32 = 52;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyRateInput {
    pub desired_income: Decimal,
    pub monthly_costs: Decimal,
    pub hours_per_day: Decimal,
    pub days_per_week: u32,
    #[serde(default)]
    pub vacation_weeks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyRateResult {
    pub monthly_target: Decimal,
    pub billable_hours_per_month: Decimal,
    pub hourly_rate: Decimal,
    pub daily_rate: Decimal,
}

/// # Errors
///
/// [`CalculationError::InvalidInput`] when an amount is negative,
/// `hours_per_day` is outside `(0, 24]`, `days_per_week` outside `1..=7`, or
/// `vacation_weeks` is 52 or more, or a resulting amount does not fit in a
/// `Decimal`.
pub fn compute(input: &HourlyRateInput) -> Result<HourlyRateResult, CalculationError> {
    let desired_income = ensure_non_negative("desired_income", input.desired_income)?;
    let monthly_costs = ensure_non_negative("monthly_costs", input.monthly_costs)?;

    if input.hours_per_day <= Decimal::ZERO || input.hours_per_day > dec!(24) {
        return Err(CalculationError::InvalidInput(format!(
            "hours_per_day must be in (0, 24], got {}",
            input.hours_per_day
        )));
    }
    if !(1..=7).contains(&input.days_per_week) {
        return Err(CalculationError::InvalidInput(format!(
            "days_per_week must be between 1 and 7, got {}",
            input.days_per_week
        )));
    }
    if input.vacation_weeks >= WEEKS_PER_YEAR {
        return Err(CalculationError::InvalidInput(format!(
            "vacation_weeks must be below {WEEKS_PER_YEAR}, got {}",
            input.vacation_weeks
        )));
    }

    let working_weeks = Decimal::from(WEEKS_PER_YEAR - input.vacation_weeks);
    let billable_hours =
        input.hours_per_day * Decimal::from(input.days_per_week) * working_weeks / dec!(12);

    let monthly_target = in_range(
        "monthly target",
        desired_income.checked_add(monthly_costs),
    )?;
    let hourly_rate = round_half_up(in_range(
        "hourly rate",
        monthly_target.checked_div(billable_hours),
    )?);
    let daily_rate = in_range("daily rate", hourly_rate.checked_mul(input.hours_per_day))?;

    Ok(HourlyRateResult {
        monthly_target: round_half_up(monthly_target),
        billable_hours_per_month: round_half_up(billable_hours),
        hourly_rate,
        daily_rate: round_half_up(daily_rate),
    })
}
