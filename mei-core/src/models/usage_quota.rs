use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::Plan;

/// A count ceiling, or none at all.
///
/// On the wire an unlimited value is the integer `-1`, which is what the web
/// client has always received for premium accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Count(u32),
    Unlimited,
}

impl Limit {
    pub const UNLIMITED_SENTINEL: i64 = -1;

    pub fn as_sentinel(&self) -> i64 {
        match self {
            Self::Count(n) => i64::from(*n),
            Self::Unlimited => Self::UNLIMITED_SENTINEL,
        }
    }

    pub fn from_sentinel(value: i64) -> Option<Self> {
        if value == Self::UNLIMITED_SENTINEL {
            return Some(Self::Unlimited);
        }
        u32::try_from(value).ok().map(Self::Count)
    }
}

impl Serialize for Limit {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.as_sentinel())
    }
}

impl<'de> Deserialize<'de> for Limit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        Limit::from_sentinel(value).ok_or_else(|| {
            serde::de::Error::custom(format!("limit must be -1 or a non-negative count, got {value}"))
        })
    }
}

/// Plan, usage and ceiling for the current metering period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageQuota {
    pub plan: Plan,
    pub used: u32,
    pub limit: Limit,
    pub remaining: Limit,
}

impl UsageQuota {
    pub fn new(
        plan: Plan,
        used: u32,
        limit: Limit,
    ) -> Self {
        let remaining = match limit {
            Limit::Count(max) => Limit::Count(max.saturating_sub(used)),
            Limit::Unlimited => Limit::Unlimited,
        };
        Self {
            plan,
            used,
            limit,
            remaining,
        }
    }
}
