//! Per-customer ledger of observed attempt ids and accepted loads

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CustomerId, LoadId, RecordedLoad};

/// Monday of the week containing `day`
fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Rolling load history for a single customer.
///
/// Two views of history are kept: the set of every attempt id ever
/// observed (accepted or not), and the accepted loads grouped into
/// calendar-day buckets. An id present in a day bucket is always
/// present in the seen set; the reverse does not hold for attempts a
/// cap rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    customer_id: CustomerId,
    seen_load_ids: HashSet<LoadId>,
    loads_by_day: BTreeMap<NaiveDate, Vec<RecordedLoad>>,
}

impl AccountState {
    pub fn new(customer_id: impl Into<CustomerId>) -> Self {
        Self {
            customer_id: customer_id.into(),
            seen_load_ids: HashSet::new(),
            loads_by_day: BTreeMap::new(),
        }
    }

    pub fn customer_id(&self) -> &str {
        &self.customer_id
    }

    /// Whether this attempt id has been observed before
    pub fn has_seen(&self, load_id: &str) -> bool {
        self.seen_load_ids.contains(load_id)
    }

    /// Remember an attempt id regardless of the eventual verdict
    pub fn note_attempt(&mut self, load_id: impl Into<LoadId>) {
        self.seen_load_ids.insert(load_id.into());
    }

    /// Record an accepted load into its day bucket.
    ///
    /// Also inserts the load's id into the seen set, so a recorded
    /// load can never be re-observed as fresh.
    pub fn record(&mut self, load: RecordedLoad) {
        self.seen_load_ids.insert(load.id.clone());
        self.loads_by_day.entry(load.day_key()).or_default().push(load);
    }

    /// Accepted loads recorded on `day`, oldest first
    pub fn loads_on(&self, day: NaiveDate) -> &[RecordedLoad] {
        self.loads_by_day.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of accepted loads recorded on `day`
    pub fn count_on(&self, day: NaiveDate) -> usize {
        self.loads_on(day).len()
    }

    /// Accepted total recorded on `day`
    pub fn total_on(&self, day: NaiveDate) -> Decimal {
        self.loads_on(day).iter().fold(Decimal::ZERO, |acc, load| acc + load.amount)
    }

    /// Accepted total from the Monday of `day`'s week through `day` inclusive
    pub fn week_to_date_total(&self, day: NaiveDate) -> Decimal {
        self.loads_by_day
            .range(week_start(day)..=day)
            .flat_map(|(_, loads)| loads)
            .fold(Decimal::ZERO, |acc, load| acc + load.amount)
    }
}
