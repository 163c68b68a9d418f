//! Achievement badges derived from a user's saved history.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{CalculationKind, Plan};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    FirstCalculation,
    TenCalculations,
    FiftyCalculations,
    /// Saved at least one calculation of every kind.
    Explorer,
    Premium,
}

impl Badge {
    pub fn title(&self) -> &'static str {
        match self {
            Self::FirstCalculation => "Primeiro cálculo",
            Self::TenCalculations => "10 cálculos",
            Self::FiftyCalculations => "50 cálculos",
            Self::Explorer => "Explorador",
            Self::Premium => "Assinante Premium",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageStats {
    /// All-time count, not the metered period.
    pub total_calculations: u32,
    pub kinds_used: BTreeSet<CalculationKind>,
    pub plan: Plan,
}

/// Badges earned for `stats`, in declaration order.
pub fn earned(stats: &UsageStats) -> Vec<Badge> {
    let mut badges = Vec::new();

    for (threshold, badge) in [
        (1, Badge::FirstCalculation),
        (10, Badge::TenCalculations),
        (50, Badge::FiftyCalculations),
    ] {
        if stats.total_calculations >= threshold {
            badges.push(badge);
        }
    }

    if CalculationKind::all()
        .iter()
        .all(|kind| stats.kinds_used.contains(kind))
    {
        badges.push(Badge::Explorer);
    }

    if stats.plan == Plan::Premium {
        badges.push(Badge::Premium);
    }

    badges
}
