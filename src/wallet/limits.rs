//! Withdrawal limit policy
//!
//! Pure lookup from verification tier to the fixed ceiling table. No
//! side effects; account existence is checked by the caller.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::types::Tier;

/// Per-tier withdrawal ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct TierLimits {
    pub min_amount: Decimal,
    pub max_amount: Decimal,
    pub daily_limit: Decimal,
    pub monthly_limit: Decimal,
}

/// Resolve the ceiling row for a tier.
pub fn limits_for(tier: Tier) -> TierLimits {
    let row = |min: i64, max: i64, daily: i64, monthly: i64| TierLimits {
        min_amount: Decimal::from(min),
        max_amount: Decimal::from(max),
        daily_limit: Decimal::from(daily),
        monthly_limit: Decimal::from(monthly),
    };

    match tier {
        Tier::Basic => row(10, 1_000, 2_000, 5_000),
        Tier::Verified => row(10, 5_000, 10_000, 25_000),
        Tier::Premium => row(10, 10_000, 20_000, 50_000),
    }
}

impl TierLimits {
    /// Check a per-transaction amount against the inclusive [min, max] bound.
    ///
    /// Returns the violated bound's name on failure so the caller can
    /// surface a precise validation message.
    pub fn check_amount(&self, amount: Decimal) -> Result<(), BoundViolation> {
        if amount < self.min_amount {
            return Err(BoundViolation::BelowMin(self.min_amount));
        }
        if amount > self.max_amount {
            return Err(BoundViolation::AboveMax(self.max_amount));
        }
        Ok(())
    }
}

/// Which per-transaction bound an amount violated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundViolation {
    BelowMin(Decimal),
    AboveMax(Decimal),
}

impl std::fmt::Display for BoundViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundViolation::BelowMin(min) => {
                write!(f, "amount is below the minimum of {}", min)
            }
            BoundViolation::AboveMax(max) => {
                write!(f, "amount exceeds the maximum of {}", max)
            }
        }
    }
}
