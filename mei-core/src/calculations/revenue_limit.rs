//! Annual revenue against the MEI ceiling.
//!
//! A business opened during the year gets a ceiling proportional to its months
//! of activity. Going over the ceiling by up to 20% keeps MEI status until the
//! end of the year (the excess is taxed); going over by more than 20% loses it
//! retroactively, so the two cases are reported apart.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::CalculationError;
use super::brackets::BracketTable;
use super::common::{ensure_non_negative, max, round_half_up, round_rate};

const NEAR_LIMIT_RATIO: Decimal = dec!(0.8);
const TOLERATED_EXCESS_RATIO: Decimal = dec!(1.2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevenueLimitStatus {
    #[serde(rename = "within_limit")]
    WithinLimit,
    #[serde(rename = "near_limit")]
    NearLimit,
    #[serde(rename = "exceeded_up_to_20_percent")]
    ExceededUpTo20Percent,
    #[serde(rename = "exceeded_over_20_percent")]
    ExceededOver20Percent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueLimitCheck {
    pub annual_revenue: Decimal,
    pub months_active: u32,
    pub year: i32,
    /// Ceiling prorated to `months_active`.
    pub ceiling: Decimal,
    /// `annual_revenue / ceiling`, four decimal places.
    pub used_fraction: Decimal,
    pub remaining: Decimal,
    pub excess: Decimal,
    pub status: RevenueLimitStatus,
}

/// Checks `annual_revenue` earned over `months_active` months of `year`.
///
/// # Errors
///
/// [`CalculationError::InvalidInput`] when revenue is negative or
/// `months_active` is outside `1..=12`.
pub fn check(
    table: &BracketTable,
    annual_revenue: Decimal,
    months_active: u32,
    year: i32,
) -> Result<RevenueLimitCheck, CalculationError> {
    let annual_revenue = ensure_non_negative("annual_revenue", annual_revenue)?;
    if !(1..=12).contains(&months_active) {
        return Err(CalculationError::InvalidInput(format!(
            "months_active must be between 1 and 12, got {months_active}"
        )));
    }

    let bracket = table.resolve(year);
    let ceiling = round_half_up(bracket.revenue_ceiling * Decimal::from(months_active) / dec!(12));
    let ratio = annual_revenue / ceiling;

    let status = if ratio < NEAR_LIMIT_RATIO {
        RevenueLimitStatus::WithinLimit
    } else if ratio <= Decimal::ONE {
        RevenueLimitStatus::NearLimit
    } else if ratio <= TOLERATED_EXCESS_RATIO {
        RevenueLimitStatus::ExceededUpTo20Percent
    } else {
        RevenueLimitStatus::ExceededOver20Percent
    };

    Ok(RevenueLimitCheck {
        annual_revenue,
        months_active,
        year: bracket.year,
        ceiling,
        used_fraction: round_rate(ratio),
        remaining: max(ceiling - annual_revenue, Decimal::ZERO),
        excess: max(annual_revenue - ceiling, Decimal::ZERO),
        status,
    })
}
