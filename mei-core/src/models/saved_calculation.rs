use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Calculator a saved record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationKind {
    Das,
    MonthlyGuide,
    RevenueLimit,
    Margin,
    HourlyRate,
}

impl CalculationKind {
    pub fn all() -> &'static [CalculationKind] {
        &[
            CalculationKind::Das,
            CalculationKind::MonthlyGuide,
            CalculationKind::RevenueLimit,
            CalculationKind::Margin,
            CalculationKind::HourlyRate,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Das => "das",
            Self::MonthlyGuide => "monthly_guide",
            Self::RevenueLimit => "revenue_limit",
            Self::Margin => "margin",
            Self::HourlyRate => "hourly_rate",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "das" => Some(Self::Das),
            "monthly_guide" => Some(Self::MonthlyGuide),
            "revenue_limit" => Some(Self::RevenueLimit),
            "margin" => Some(Self::Margin),
            "hourly_rate" => Some(Self::HourlyRate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCalculation {
    pub id: i64,
    pub user_id: String,
    pub kind: CalculationKind,

    // Request body and computed output, kept verbatim for auditability
    pub input: Value,
    pub result: Value,

    pub created_at: DateTime<Utc>,
}

/// For recording new calculations (no id or timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSavedCalculation {
    pub user_id: String,
    pub kind: CalculationKind,
    pub input: Value,
    pub result: Value,
}
