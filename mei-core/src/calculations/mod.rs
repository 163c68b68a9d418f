//! Calculators offered to MEI users.
//!
//! Every calculator here is a pure function of its input and the read-only
//! [`BracketTable`]; persistence and quota accounting happen in the callers.

pub mod badges;
pub mod brackets;
pub mod common;
pub mod das;
pub mod hourly_rate;
pub mod margin;
pub mod monthly_guide;
pub mod quota;
pub mod revenue_limit;

use thiserror::Error;

pub use badges::{Badge, UsageStats};
pub use brackets::{BracketTable, BracketTableBuilder, BracketTableError};
pub use das::{CalculationResult, DasCalculator};
pub use hourly_rate::{HourlyRateInput, HourlyRateResult};
pub use margin::{MarginResult, SuggestedPrice};
pub use monthly_guide::{Activity, MonthlyGuide};
pub use quota::{FREE_LIMIT, QuotaConfig, QuotaDecision, QuotaGate, usage_period_start};
pub use revenue_limit::{RevenueLimitCheck, RevenueLimitStatus};

/// Errors raised by calculators for input they refuse to compute on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalculationError {
    /// Malformed or out-of-range numeric input, or an unrecognized annex tag.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
