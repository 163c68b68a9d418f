//! DAS (Simples Nacional) tax due for a revenue figure.
//!
//! ```text
//! tax_due = max(revenue × aliquota − deducao, 0)    rounded to cents
//! effective_rate = tax_due / revenue                 (0 when revenue is 0)
//! ```
//!
//! The annex rate comes from the [`BracketTable`] entry for the requested year,
//! or the latest year when the requested one is unknown.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use mei_core::Annex;
//! use mei_core::calculations::{BracketTable, DasCalculator};
//!
//! let calculator = DasCalculator::new(BracketTable::builtin());
//! let result = calculator.compute(dec!(5000), Annex::III, 2025).unwrap();
//!
//! assert_eq!(result.tax_due, dec!(224.50));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::CalculationError;
use super::brackets::BracketTable;
use super::common::{ensure_non_negative, max, round_half_up, round_rate};
use crate::models::{Annex, AnnexRate, BracketConfig};

/// Output of a DAS computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub revenue: Decimal,
    pub annex: Annex,
    /// Tax due, rounded to two decimal places.
    pub tax_due: Decimal,
    /// `tax_due / revenue`, four decimal places.
    pub effective_rate: Decimal,
    pub requested_year: i32,
    /// True when `requested_year` had no entry and the latest year was used.
    pub used_fallback: bool,
    /// The bracket the amounts were computed with.
    pub bracket: BracketConfig,
}

/// Computes DAS amounts against a bracket table.
#[derive(Debug, Clone, Copy)]
pub struct DasCalculator<'a> {
    table: &'a BracketTable,
}

impl<'a> DasCalculator<'a> {
    pub fn new(table: &'a BracketTable) -> Self {
        Self { table }
    }

    /// Computes the tax due on `revenue` under `annex` for `year`.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] if `revenue` is negative.
    pub fn compute(
        &self,
        revenue: Decimal,
        annex: Annex,
        year: i32,
    ) -> Result<CalculationResult, CalculationError> {
        let revenue = ensure_non_negative("revenue", revenue)?;

        let bracket = self.table.resolve(year);
        let rate = bracket.annexes.get(annex);

        let tax_due = self.tax_due(revenue, rate);
        let effective_rate = self.effective_rate(tax_due, revenue);

        debug!(%revenue, %annex, year, resolved_year = bracket.year, %tax_due, "computed DAS");

        Ok(CalculationResult {
            revenue,
            annex,
            tax_due,
            effective_rate,
            requested_year: year,
            used_fallback: bracket.year != year,
            bracket: bracket.clone(),
        })
    }

    /// Same as [`compute`](Self::compute) but takes the annex as its textual
    /// tag, as received from a form or request body.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidInput`] for an unknown tag; there is
    /// no default annex.
    pub fn compute_tagged(
        &self,
        revenue: Decimal,
        annex: &str,
        year: i32,
    ) -> Result<CalculationResult, CalculationError> {
        let annex = Annex::parse(annex).ok_or_else(|| {
            CalculationError::InvalidInput(format!(
                "unknown annex '{annex}', expected one of I, III, V"
            ))
        })?;
        self.compute(revenue, annex, year)
    }

    /// Linear term minus deduction, never below zero.
    fn tax_due(
        &self,
        revenue: Decimal,
        rate: &AnnexRate,
    ) -> Decimal {
        round_half_up(max(revenue * rate.aliquota - rate.deducao, Decimal::ZERO))
    }

    fn effective_rate(
        &self,
        tax_due: Decimal,
        revenue: Decimal,
    ) -> Decimal {
        if revenue.is_zero() {
            return Decimal::ZERO;
        }
        round_rate(tax_due / revenue)
    }
}
