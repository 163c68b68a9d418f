mod annex;
mod bracket_config;
mod plan;
mod saved_calculation;
mod usage_quota;
mod user;

pub use annex::Annex;
pub use bracket_config::{AnnexRate, AnnexTable, BracketConfig};
pub use plan::Plan;
pub use saved_calculation::{CalculationKind, NewSavedCalculation, SavedCalculation};
pub use usage_quota::{Limit, UsageQuota};
pub use user::{NewUser, User};
