//! VelocityCore - deterministic per-customer fund-load limit engine
//!
//! Evaluates decoded load attempts against a customer's rolling
//! history: duplicate-id suppression, a daily load count cap, a daily
//! amount cap, and a Monday-to-Sunday weekly amount cap. The engine is
//! pure state-in/verdict-out; parsing, storage, and I/O live in the
//! surrounding crates.

mod config;
mod evaluator;
mod ledger;
mod types;

pub use config::{LimitsError, VelocityLimits};
pub use evaluator::LimitEvaluator;
pub use ledger::AccountState;
pub use types::{CustomerId, LoadId, LoadRequest, RecordedLoad, RejectReason, Verdict};
