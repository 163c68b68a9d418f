//! Plan-based gate for metered actions (saving a calculation).
//!
//! The gate only decides; the caller supplies the usage count for the current
//! period and records the action afterwards. Between those two steps two
//! concurrent requests from the same user can both see a count below the
//! limit, so callers that must never overshoot should record through an
//! atomic reserve (see `MeiRepository::reserve_calculation`).

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Limit, Plan, UsageQuota};

/// Saved calculations a FREE account may record per period.
pub const FREE_LIMIT: u32 = 10;

/// Metering settings, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaConfig {
    pub free_limit: u32,
    /// When false every plan is unlimited. Used when no billing provider is
    /// configured, since FREE users would have no way to upgrade.
    pub metering_enabled: bool,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_limit: FREE_LIMIT,
            metering_enabled: true,
        }
    }
}

/// Result of [`QuotaGate::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaDecision {
    pub allowed: bool,
    pub remaining: Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaGate {
    config: QuotaConfig,
}

impl QuotaGate {
    pub fn new(config: QuotaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Ceiling that applies to `plan` under this configuration.
    pub fn limit_for(
        &self,
        plan: Plan,
    ) -> Limit {
        match plan {
            _ if !self.config.metering_enabled => Limit::Unlimited,
            Plan::Premium => Limit::Unlimited,
            Plan::Free => Limit::Count(self.config.free_limit),
        }
    }

    /// Decides whether one more metered action is allowed after `used` have
    /// already been recorded this period. Reaching the limit exactly denies.
    pub fn check(
        &self,
        plan: Plan,
        used: u32,
    ) -> QuotaDecision {
        let decision = match self.limit_for(plan) {
            Limit::Unlimited => QuotaDecision {
                allowed: true,
                remaining: Limit::Unlimited,
            },
            Limit::Count(limit) => QuotaDecision {
                allowed: used < limit,
                remaining: Limit::Count(limit.saturating_sub(used)),
            },
        };
        debug!(%plan, used, allowed = decision.allowed, "quota check");
        decision
    }

    pub fn quota(
        &self,
        plan: Plan,
        used: u32,
    ) -> UsageQuota {
        UsageQuota::new(plan, used, self.limit_for(plan))
    }
}

/// Start of the metering period containing `now`: the first day of the
/// calendar month, midnight UTC.
pub fn usage_period_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn gate() -> QuotaGate {
        QuotaGate::new(QuotaConfig::default())
    }

    // =========================================================================
    // check tests
    // =========================================================================

    #[test]
    fn free_below_limit_is_allowed() {
        let decision = gate().check(Plan::Free, 0);

        assert_eq!(
            decision,
            QuotaDecision {
                allowed: true,
                remaining: Limit::Count(10),
            }
        );
    }

    #[test]
    fn free_one_below_limit_is_allowed_with_one_remaining() {
        let decision = gate().check(Plan::Free, FREE_LIMIT - 1);

        assert!(decision.allowed);
        assert_eq!(decision.remaining, Limit::Count(1));
    }

    #[test]
    fn free_at_limit_is_denied() {
        let decision = gate().check(Plan::Free, FREE_LIMIT);

        assert!(!decision.allowed);
        assert_eq!(decision.remaining, Limit::Count(0));
    }

    #[test]
    fn free_above_limit_is_denied_without_underflow() {
        let decision = gate().check(Plan::Free, FREE_LIMIT + 5);

        assert!(!decision.allowed);
        assert_eq!(decision.remaining, Limit::Count(0));
    }

    #[test]
    fn premium_is_always_allowed() {
        let decision = gate().check(Plan::Premium, 1_000_000);

        assert!(decision.allowed);
        assert_eq!(decision.remaining, Limit::Unlimited);
    }

    #[test]
    fn custom_free_limit_is_honoured() {
        let gate = QuotaGate::new(QuotaConfig {
            free_limit: 3,
            metering_enabled: true,
        });

        assert!(gate.check(Plan::Free, 2).allowed);
        assert!(!gate.check(Plan::Free, 3).allowed);
    }

    #[test]
    fn zero_free_limit_denies_everything() {
        let gate = QuotaGate::new(QuotaConfig {
            free_limit: 0,
            metering_enabled: true,
        });

        assert!(!gate.check(Plan::Free, 0).allowed);
    }

    #[test]
    fn metering_disabled_makes_free_unlimited() {
        let gate = QuotaGate::new(QuotaConfig {
            free_limit: FREE_LIMIT,
            metering_enabled: false,
        });

        let decision = gate.check(Plan::Free, 500);

        assert!(decision.allowed);
        assert_eq!(decision.remaining, Limit::Unlimited);
    }

    // =========================================================================
    // quota tests
    // =========================================================================

    #[test]
    fn quota_for_free_reports_remaining() {
        let quota = gate().quota(Plan::Free, 4);

        assert_eq!(quota.limit, Limit::Count(10));
        assert_eq!(quota.remaining, Limit::Count(6));
    }

    #[test]
    fn quota_for_premium_is_unlimited() {
        let quota = gate().quota(Plan::Premium, 42);

        assert_eq!(quota.limit, Limit::Unlimited);
        assert_eq!(quota.remaining, Limit::Unlimited);
    }

    // =========================================================================
    // usage_period_start tests
    // =========================================================================

    #[test]
    fn period_starts_on_first_of_month_utc() {
        let now = Utc.with_ymd_and_hms(2025, 3, 17, 15, 42, 9).unwrap();

        let start = usage_period_start(now);

        assert_eq!(start, Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn period_start_is_stable_at_midnight_of_first() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(usage_period_start(now), now);
    }
}
