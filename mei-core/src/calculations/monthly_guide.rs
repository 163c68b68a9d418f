//! Fixed monthly DAS-MEI payment.
//!
//! A MEI pays a flat monthly guide regardless of revenue: an INSS share of the
//! minimum wage plus flat ICMS (commerce, industry) and/or ISS (services)
//! amounts.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::brackets::BracketTable;
use super::common::round_half_up;

const INSS_RATE: Decimal = dec!(0.05);
const ICMS_AMOUNT: Decimal = dec!(1.00);
const ISS_AMOUNT: Decimal = dec!(5.00);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Commerce,
    Industry,
    Services,
    CommerceAndServices,
}

impl Activity {
    fn pays_icms(&self) -> bool {
        matches!(
            self,
            Self::Commerce | Self::Industry | Self::CommerceAndServices
        )
    }

    fn pays_iss(&self) -> bool {
        matches!(self, Self::Services | Self::CommerceAndServices)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyGuide {
    pub activity: Activity,
    pub requested_year: i32,
    /// Year whose minimum wage was applied.
    pub year: i32,
    pub inss: Decimal,
    pub icms: Decimal,
    pub iss: Decimal,
    pub total: Decimal,
}

/// Monthly guide for `activity` in `year` (latest known year if unknown).
pub fn compute(
    table: &BracketTable,
    activity: Activity,
    year: i32,
) -> MonthlyGuide {
    let bracket = table.resolve(year);

    let inss = round_half_up(bracket.minimum_wage * INSS_RATE);
    let icms = if activity.pays_icms() {
        ICMS_AMOUNT
    } else {
        Decimal::ZERO
    };
    let iss = if activity.pays_iss() {
        ISS_AMOUNT
    } else {
        Decimal::ZERO
    };

    MonthlyGuide {
        activity,
        requested_year: year,
        year: bracket.year,
        inss,
        icms,
        iss,
        total: round_half_up(inss + icms + iss),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn commerce_pays_inss_and_icms() {
        let guide = compute(BracketTable::builtin(), Activity::Commerce, 2025);

        // 1518.00 × 5% = 75.90, + 1.00 ICMS
        assert_eq!(guide.inss, dec!(75.90));
        assert_eq!(guide.icms, dec!(1.00));
        assert_eq!(guide.iss, dec!(0));
        assert_eq!(guide.total, dec!(76.90));
    }

    #[test]
    fn industry_matches_commerce() {
        let commerce = compute(BracketTable::builtin(), Activity::Commerce, 2025);
        let industry = compute(BracketTable::builtin(), Activity::Industry, 2025);

        assert_eq!(industry.total, commerce.total);
    }

    #[test]
    fn services_pay_inss_and_iss() {
        let guide = compute(BracketTable::builtin(), Activity::Services, 2025);

        assert_eq!(guide.total, dec!(80.90));
    }

    #[test]
    fn commerce_and_services_pay_both() {
        let guide = compute(BracketTable::builtin(), Activity::CommerceAndServices, 2025);

        assert_eq!(guide.total, dec!(81.90));
    }

    #[test]
    fn earlier_year_uses_its_minimum_wage() {
        let guide = compute(BracketTable::builtin(), Activity::Services, 2024);

        // 1412.00 × 5% = 70.60, + 5.00 ISS
        assert_eq!(guide.year, 2024);
        assert_eq!(guide.total, dec!(75.60));
    }

    #[test]
    fn unknown_year_uses_latest_wage() {
        let guide = compute(BracketTable::builtin(), Activity::Commerce, 2040);

        assert_eq!(guide.requested_year, 2040);
        assert_eq!(guide.year, 2025);
    }
}
