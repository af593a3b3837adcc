//! LoadGateway - the boundary between raw request lines and the core
//!
//! Decodes newline-delimited JSON fund-load requests into well-typed
//! [`velocity_core::LoadRequest`]s, runs them through the limit
//! evaluator against the account store, and encodes the accept/reject
//! responses. Duplicate attempts are swallowed here: they produce no
//! response at all, by policy.

mod error;
mod handler;
mod messages;

pub use error::{GatewayError, GatewayResult};
pub use handler::LoadHandler;
pub use messages::{decode_request, LoadMessage, LoadResponse};
