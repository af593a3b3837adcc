//! Velocity cap configuration

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Per-customer velocity caps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityLimits {
    /// Maximum accepted loads per calendar day
    pub daily_load_count: u32,
    /// Maximum accepted total per calendar day
    pub daily_amount_cap: Decimal,
    /// Maximum accepted total per Monday-to-Sunday week
    pub weekly_amount_cap: Decimal,
}

impl Default for VelocityLimits {
    fn default() -> Self {
        Self {
            daily_load_count: 3,
            daily_amount_cap: Decimal::new(5_000_00, 2),
            weekly_amount_cap: Decimal::new(20_000_00, 2),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LimitsError {
    #[error("daily load count must be at least 1")]
    ZeroDailyCount,
    #[error("daily amount cap must be positive, got {0}")]
    NonPositiveDailyCap(Decimal),
    #[error("weekly amount cap must be positive, got {0}")]
    NonPositiveWeeklyCap(Decimal),
    #[error("weekly amount cap {weekly} is below the daily amount cap {daily}")]
    WeeklyBelowDaily { daily: Decimal, weekly: Decimal },
}

impl VelocityLimits {
    pub fn validate(&self) -> Result<(), LimitsError> {
        if self.daily_load_count == 0 {
            return Err(LimitsError::ZeroDailyCount);
        }
        if self.daily_amount_cap <= Decimal::ZERO {
            return Err(LimitsError::NonPositiveDailyCap(self.daily_amount_cap));
        }
        if self.weekly_amount_cap <= Decimal::ZERO {
            return Err(LimitsError::NonPositiveWeeklyCap(self.weekly_amount_cap));
        }
        if self.weekly_amount_cap < self.daily_amount_cap {
            return Err(LimitsError::WeeklyBelowDaily {
                daily: self.daily_amount_cap,
                weekly: self.weekly_amount_cap,
            });
        }
        Ok(())
    }
}
