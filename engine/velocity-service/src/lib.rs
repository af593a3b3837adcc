//! Velocity Limits Batch Service Library
//!
//! Wires the limit evaluator, account store, and load gateway into a
//! concurrent line pipeline: newline-delimited JSON requests in,
//! accept/reject response lines out, in input order. Requests for one
//! customer always flow through one worker, so per-customer evaluation
//! stays strictly sequential no matter how many workers run.

pub mod config;
pub mod logging;
pub mod pipeline;


pub use config::{load_config, LoggingConfig, ServiceConfig};
pub use logging::initialize_logging;
pub use pipeline::{Pipeline, PipelineConfig, StatsSnapshot};
