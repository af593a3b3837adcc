//! Error types for the LoadGateway

use thiserror::Error;

/// Errors that can occur while decoding or handling a request line
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid load amount {value:?} for load {load_id}: {reason}")]
    InvalidAmount { load_id: String, value: String, reason: String },

    #[error("Invalid timestamp {value:?} for load {load_id}: {source}")]
    InvalidTimestamp {
        load_id: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Result type for LoadGateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
