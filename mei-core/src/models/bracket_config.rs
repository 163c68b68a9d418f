use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Annex;

/// Nominal rate and fixed deduction of one annex for a tax year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnexRate {
    /// Fraction in `[0, 1)`.
    pub aliquota: Decimal,
    pub deducao: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnexTable {
    #[serde(rename = "I")]
    pub i: AnnexRate,
    #[serde(rename = "III")]
    pub iii: AnnexRate,
    #[serde(rename = "V")]
    pub v: AnnexRate,
}

impl AnnexTable {
    pub fn get(
        &self,
        annex: Annex,
    ) -> &AnnexRate {
        match annex {
            Annex::I => &self.i,
            Annex::III => &self.iii,
            Annex::V => &self.v,
        }
    }
}

/// DAS parameters for one tax year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketConfig {
    pub year: i32,
    pub minimum_wage: Decimal,
    /// Annual gross revenue ceiling for MEI status.
    pub revenue_ceiling: Decimal,
    pub annexes: AnnexTable,
}
