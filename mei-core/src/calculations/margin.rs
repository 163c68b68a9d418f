//! Profit margin and markup for a sale price and unit cost.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::CalculationError;
use super::common::{ensure_non_negative, ensure_positive, in_range, round_half_up, round_rate};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginResult {
    pub price: Decimal,
    pub cost: Decimal,
    /// Negative when selling at a loss.
    pub profit: Decimal,
    /// `profit / price`.
    pub margin: Decimal,
    /// `profit / cost`; absent when cost is zero.
    pub markup: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedPrice {
    pub cost: Decimal,
    pub target_margin: Decimal,
    pub price: Decimal,
    pub profit: Decimal,
}

/// # Errors
///
/// [`CalculationError::InvalidInput`] when `price` is not positive, `cost`
/// is negative, or a ratio does not fit in a `Decimal`.
pub fn compute(
    price: Decimal,
    cost: Decimal,
) -> Result<MarginResult, CalculationError> {
    let price = ensure_positive("price", price)?;
    let cost = ensure_non_negative("cost", cost)?;

    let profit = price - cost;
    let markup = if cost.is_zero() {
        None
    } else {
        Some(round_rate(in_range("markup", profit.checked_div(cost))?))
    };
    let margin = round_rate(in_range("margin", profit.checked_div(price))?);

    Ok(MarginResult {
        price,
        cost,
        profit: round_half_up(profit),
        margin,
        markup,
    })
}

/// Price that yields `target_margin` over `cost`: `cost / (1 - target_margin)`.
///
/// # Errors
///
/// [`CalculationError::InvalidInput`] when `cost` is negative,
/// `target_margin` is outside `[0, 1)`, or the price does not fit in a
/// `Decimal`.
pub fn suggested_price(
    cost: Decimal,
    target_margin: Decimal,
) -> Result<SuggestedPrice, CalculationError> {
    let cost = ensure_non_negative("cost", cost)?;
    if target_margin < Decimal::ZERO || target_margin >= Decimal::ONE {
        return Err(CalculationError::InvalidInput(format!(
            "target_margin must be in [0, 1), got {target_margin}"
        )));
    }

    let price = round_half_up(in_range(
        "suggested price",
        cost.checked_div(Decimal::ONE - target_margin),
    )?);

    Ok(SuggestedPrice {
        cost,
        target_margin,
        price,
        profit: price - cost,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn compute_profit_margin_and_markup() {
        let result = compute(dec!(100), dec!(60)).unwrap();

        assert_eq!(result.profit, dec!(40.00));
        assert_eq!(result.margin, dec!(0.4));
        assert_eq!(result.markup, Some(dec!(0.6667)));
    }

    #[test]
    fn compute_zero_cost_has_no_markup() {
        let result = compute(dec!(50), dec!(0)).unwrap();

        assert_eq!(result.margin, dec!(1));
        assert_eq!(result.markup, None);
    }

    #[test]
    fn compute_reports_loss_as_negative_margin() {
        let result = compute(dec!(80), dec!(100)).unwrap();

        assert_eq!(result.profit, dec!(-20.00));
        assert_eq!(result.margin, dec!(-0.25));
        assert_eq!(result.markup, Some(dec!(-0.2)));
    }

    #[test]
    fn compute_rejects_zero_price() {
        assert!(compute(dec!(0), dec!(10)).is_err());
    }

    #[test]
    fn compute_rejects_negative_cost() {
        assert!(compute(dec!(10), dec!(-1)).is_err());
    }

    #[test]
    fn suggested_price_hits_target_margin() {
        let result = suggested_price(dec!(60), dec!(0.4)).unwrap();

        assert_eq!(result.price, dec!(100.00));
        assert_eq!(result.profit, dec!(40.00));
    }

    #[test]
    fn suggested_price_rounds_to_cents() {
        let result = suggested_price(dec!(10), dec!(0.3)).unwrap();

        // 10 / 0.7 = 14.2857…
        assert_eq!(result.price, dec!(14.29));
    }

    #[test]
    fn compute_reports_overflowing_markup_as_invalid_input() {
        let result = compute(Decimal::MAX, dec!(0.0000000000000000000000000001));

        assert_eq!(
            result,
            Err(CalculationError::InvalidInput("markup out of range".to_string()))
        );
    }

    #[test]
    fn compute_reports_overflowing_margin_as_invalid_input() {
        let result = compute(dec!(0.0000000000000000000000000001), Decimal::MAX);

        assert!(matches!(result, Err(CalculationError::InvalidInput(_))));
    }

    #[test]
    fn suggested_price_near_full_margin_is_invalid_input() {
        let result = suggested_price(dec!(1000000), dec!(0.9999999999999999999999999));

        assert_eq!(
            result,
            Err(CalculationError::InvalidInput(
                "suggested price out of range".to_string()
            ))
        );
    }

    #[test]
    fn suggested_price_rejects_full_margin() {
        let result = suggested_price(dec!(10), dec!(1));

        assert_eq!(
            result,
            Err(CalculationError::InvalidInput(
                "target_margin must be in [0, 1), got 1".to_string()
            ))
        );
    }
}
