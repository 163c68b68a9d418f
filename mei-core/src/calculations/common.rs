//! Common utility functions for MEI calculations.
//!
//! Rounding policy lives here so every calculator settles currency amounts and
//! rates the same way.

use rust_decimal::{Decimal, RoundingStrategy};

use super::CalculationError;

/// Decimal places kept on ratios (effective rate, margin, markup).
pub const RATE_DECIMAL_PLACES: u32 = 4;

/// Rounds a currency amount to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero, which is what
/// `Number.prototype.toFixed` produces for the amounts the web client shows.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use mei_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds a ratio to [`RATE_DECIMAL_PLACES`] using the same midpoint rule as
/// [`round_half_up`].
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
///
/// ```
/// use rust_decimal_macros::dec;
/// use mei_core::calculations::common::max;
///
/// assert_eq!(max(dec!(-5.90), dec!(0)), dec!(0));
/// ```
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Rejects negative amounts, naming the offending field.
pub fn ensure_non_negative(
    field: &str,
    value: Decimal,
) -> Result<Decimal, CalculationError> {
    if value < Decimal::ZERO {
        return Err(CalculationError::InvalidInput(format!(
            "{field} must be non-negative, got {value}"
        )));
    }
    Ok(value)
}

/// Rejects zero and negative amounts, naming the offending field.
pub fn ensure_positive(
    field: &str,
    value: Decimal,
) -> Result<Decimal, CalculationError> {
    if value <= Decimal::ZERO {
        return Err(CalculationError::InvalidInput(format!(
            "{field} must be positive, got {value}"
        )));
    }
    Ok(value)
}

/// Unwraps a `checked_*` result, reporting overflow as invalid input.
pub fn in_range(
    what: &str,
    value: Option<Decimal>,
) -> Result<Decimal, CalculationError> {
    value.ok_or_else(|| CalculationError::InvalidInput(format!("{what} out of range")))
}
