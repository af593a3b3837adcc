//! Core domain types for fund-load velocity evaluation

use core::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Load attempt identifier, unique per customer
pub type LoadId = String;
/// Customer account identifier
pub type CustomerId = String;

/// A decoded fund-load attempt, immutable once constructed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub id: LoadId,
    pub customer_id: CustomerId,
    pub amount: Decimal,
    pub time: DateTime<FixedOffset>,
}

impl LoadRequest {
    pub fn new(
        id: impl Into<LoadId>,
        customer_id: impl Into<CustomerId>,
        amount: Decimal,
        time: DateTime<FixedOffset>,
    ) -> Self {
        Self { id: id.into(), customer_id: customer_id.into(), amount, time }
    }

    /// Calendar date of the attempt in the timestamp's own offset
    #[inline]
    pub fn day_key(&self) -> NaiveDate {
        self.time.date_naive()
    }
}

/// An accepted load as it lives in the ledger's day buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedLoad {
    pub id: LoadId,
    pub amount: Decimal,
    pub time: DateTime<FixedOffset>,
}

impl RecordedLoad {
    pub fn new(id: impl Into<LoadId>, amount: Decimal, time: DateTime<FixedOffset>) -> Self {
        Self { id: id.into(), amount, time }
    }

    /// Calendar date of the load in the timestamp's own offset
    #[inline]
    pub fn day_key(&self) -> NaiveDate {
        self.time.date_naive()
    }
}

impl From<&LoadRequest> for RecordedLoad {
    fn from(request: &LoadRequest) -> Self {
        Self { id: request.id.clone(), amount: request.amount, time: request.time }
    }
}

/// Rejection reasons - explicit, enumerable
#[repr(u8)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    /// Fourth or later load attempt on one calendar day
    DailyLoadCount = 1,
    /// Daily accepted total would exceed the daily amount cap
    DailyAmount = 2,
    /// Monday-to-date accepted total would exceed the weekly amount cap
    WeeklyAmount = 3,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::DailyLoadCount => "daily_load_count",
            RejectReason::DailyAmount => "daily_amount",
            RejectReason::WeeklyAmount => "weekly_amount",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one load attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Load applied and recorded against the daily and weekly windows
    Accepted,
    /// Attempt id already observed for this customer; state untouched
    Duplicate,
    /// A velocity cap would be breached; id remembered, no load recorded
    Rejected(RejectReason),
}

impl Verdict {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    #[inline]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Verdict::Duplicate)
    }

    /// Rejection reason, if this verdict carries one
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Verdict::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}
