//! Wire message types for the load-request stream

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use velocity_core::LoadRequest;

use crate::error::{GatewayError, GatewayResult};

/// One fund-load request as it arrives on the wire.
///
/// `load_amount` is a decimal string with an optional leading `$`;
/// `time` is an RFC 3339 timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadMessage {
    pub id: String,
    pub customer_id: String,
    pub load_amount: String,
    pub time: String,
}

/// One accept/reject decision as it leaves on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResponse {
    pub id: String,
    pub customer_id: String,
    pub accepted: bool,
}

impl LoadResponse {
    pub fn new(request: &LoadRequest, accepted: bool) -> Self {
        Self { id: request.id.clone(), customer_id: request.customer_id.clone(), accepted }
    }

    /// Encode as a single JSON line (no trailing newline)
    pub fn to_json(&self) -> GatewayResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decode one JSON request line into a field-valid [`LoadRequest`].
///
/// Required fields must be present and non-empty, the amount must
/// parse as a non-negative decimal, and the timestamp must be valid
/// RFC 3339. The core never sees anything that fails here.
pub fn decode_request(line: &str) -> GatewayResult<LoadRequest> {
    let message: LoadMessage = serde_json::from_str(line)?;

    if message.id.is_empty() {
        return Err(GatewayError::MissingField("id"));
    }
    if message.customer_id.is_empty() {
        return Err(GatewayError::MissingField("customer_id"));
    }
    if message.load_amount.is_empty() {
        return Err(GatewayError::MissingField("load_amount"));
    }
    if message.time.is_empty() {
        return Err(GatewayError::MissingField("time"));
    }

    let raw_amount = message.load_amount.strip_prefix('$').unwrap_or(&message.load_amount);
    let amount: Decimal =
        raw_amount.parse().map_err(|e: rust_decimal::Error| GatewayError::InvalidAmount {
            load_id: message.id.clone(),
            value: message.load_amount.clone(),
            reason: e.to_string(),
        })?;
    if amount < Decimal::ZERO {
        return Err(GatewayError::InvalidAmount {
            load_id: message.id.clone(),
            value: message.load_amount.clone(),
            reason: "amount must not be negative".to_string(),
        });
    }

    let time = DateTime::parse_from_rfc3339(&message.time).map_err(|source| {
        GatewayError::InvalidTimestamp {
            load_id: message.id.clone(),
            value: message.time.clone(),
            source,
        }
    })?;

    Ok(LoadRequest::new(message.id, message.customer_id, amount, time))
}
