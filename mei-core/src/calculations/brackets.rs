//! Year-indexed DAS bracket table.
//!
//! The table is assembled once at process start: the built-in years below,
//! optionally extended with later years loaded from a data file. Once built it
//! is read-only. Years are only ever appended, so a calculation made for a
//! past year can always be reproduced with the same parameters.
//!
//! | Year | Minimum wage | Ceiling   | I (rate / deduction) | III            | V              |
//! |------|--------------|-----------|----------------------|----------------|----------------|
//! | 2023 | 1320.00      | 81000.00  | 0.04 / 10.00         | 0.048 / 15.50  | 0.155 / 31.00  |
//! | 2024 | 1412.00      | 81000.00  | 0.04 / 10.00         | 0.048 / 15.50  | 0.155 / 31.00  |
//! | 2025 | 1518.00      | 81000.00  | 0.04 / 10.00         | 0.048 / 15.50  | 0.155 / 31.00  |

use std::collections::BTreeMap;
use std::sync::OnceLock;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{AnnexRate, AnnexTable, BracketConfig};

/// (year, minimum wage), oldest first. The last entry is the latest known year.
const BUILTIN_MINIMUM_WAGES: [(i32, Decimal); 3] = [
    (2023, dec!(1320.00)),
    (2024, dec!(1412.00)),
    (2025, dec!(1518.00)),
];

const REVENUE_CEILING: Decimal = dec!(81000.00);

const STANDARD_ANNEXES: AnnexTable = AnnexTable {
    i: AnnexRate {
        aliquota: dec!(0.04),
        deducao: dec!(10.00),
    },
    iii: AnnexRate {
        aliquota: dec!(0.048),
        deducao: dec!(15.50),
    },
    v: AnnexRate {
        aliquota: dec!(0.155),
        deducao: dec!(31.00),
    },
};

/// Errors raised while assembling a [`BracketTable`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BracketTableError {
    /// Published years are never replaced.
    #[error("tax year {0} is already defined")]
    DuplicateYear(i32),

    #[error("invalid bracket for tax year {year}: {reason}")]
    InvalidBracket { year: i32, reason: String },

    #[error("bracket table has no tax years")]
    Empty,
}

/// Immutable mapping from tax year to [`BracketConfig`]. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketTable {
    configs: BTreeMap<i32, BracketConfig>,
    latest: BracketConfig,
}

impl BracketTable {
    /// The table compiled into the binary, shared for the life of the process.
    pub fn builtin() -> &'static BracketTable {
        static BUILTIN: OnceLock<BracketTable> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let configs = BUILTIN_MINIMUM_WAGES
                .iter()
                .map(|&(year, wage)| (year, standard_config(year, wage)))
                .collect();
            let (latest_year, latest_wage) = BUILTIN_MINIMUM_WAGES[BUILTIN_MINIMUM_WAGES.len() - 1];
            BracketTable {
                configs,
                latest: standard_config(latest_year, latest_wage),
            }
        })
    }

    /// Returns the configuration for `year`, or the latest known year's
    /// configuration when `year` has no entry of its own.
    pub fn resolve(
        &self,
        year: i32,
    ) -> &BracketConfig {
        match self.configs.get(&year) {
            Some(config) => {
                debug!(year, "resolved bracket config");
                config
            }
            None => {
                warn!(
                    requested = year,
                    fallback = self.latest.year,
                    "no bracket config for year, using latest"
                );
                &self.latest
            }
        }
    }

    /// Exact lookup without fallback.
    pub fn get(
        &self,
        year: i32,
    ) -> Option<&BracketConfig> {
        self.configs.get(&year)
    }

    pub fn latest(&self) -> &BracketConfig {
        &self.latest
    }

    /// Known years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.configs.keys().copied().collect()
    }
}

/// Collects bracket configs before freezing them into a [`BracketTable`].
#[derive(Debug, Default)]
pub struct BracketTableBuilder {
    configs: BTreeMap<i32, BracketConfig>,
}

impl BracketTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from every year already present in `table`.
    pub fn from_table(table: &BracketTable) -> Self {
        Self {
            configs: table.configs.clone(),
        }
    }

    /// Adds a new tax year.
    ///
    /// # Errors
    ///
    /// * [`BracketTableError::DuplicateYear`] if the year is already present.
    /// * [`BracketTableError::InvalidBracket`] if a rate is outside `[0, 1)`,
    ///   a deduction is negative, or the wage or ceiling is not positive.
    pub fn append(
        &mut self,
        config: BracketConfig,
    ) -> Result<&mut Self, BracketTableError> {
        if self.configs.contains_key(&config.year) {
            return Err(BracketTableError::DuplicateYear(config.year));
        }
        validate(&config)?;
        debug!(year = config.year, "appending bracket config");
        self.configs.insert(config.year, config);
        Ok(self)
    }

    pub fn build(self) -> Result<BracketTable, BracketTableError> {
        let latest = self
            .configs
            .values()
            .next_back()
            .cloned()
            .ok_or(BracketTableError::Empty)?;
        Ok(BracketTable {
            configs: self.configs,
            latest,
        })
    }
}

fn standard_config(
    year: i32,
    minimum_wage: Decimal,
) -> BracketConfig {
    BracketConfig {
        year,
        minimum_wage,
        revenue_ceiling: REVENUE_CEILING,
        annexes: STANDARD_ANNEXES,
    }
}

fn validate(config: &BracketConfig) -> Result<(), BracketTableError> {
    let invalid = |reason: String| BracketTableError::InvalidBracket {
        year: config.year,
        reason,
    };

    if config.minimum_wage <= Decimal::ZERO {
        return Err(invalid(format!(
            "minimum wage must be positive, got {}",
            config.minimum_wage
        )));
    }
    if config.revenue_ceiling <= Decimal::ZERO {
        return Err(invalid(format!(
            "revenue ceiling must be positive, got {}",
            config.revenue_ceiling
        )));
    }
    for annex in crate::models::Annex::all() {
        let rate = config.annexes.get(*annex);
        if rate.aliquota < Decimal::ZERO || rate.aliquota >= Decimal::ONE {
            return Err(invalid(format!(
                "annex {annex} rate must be in [0, 1), got {}",
                rate.aliquota
            )));
        }
        if rate.deducao < Decimal::ZERO {
            return Err(invalid(format!(
                "annex {annex} deduction must be non-negative, got {}",
                rate.deducao
            )));
        }
    }
    Ok(())
}
