//! Request handling: fetch state, evaluate, persist, shape the response

use std::sync::Arc;

use account_store::AccountStore;
use tracing::debug;
use velocity_core::{AccountState, LimitEvaluator, LoadRequest, Verdict};

use crate::messages::{decode_request, LoadResponse};
use crate::GatewayResult;

/// Orchestrates one load attempt end to end.
///
/// For each request: fetch (or lazily create) the customer's account
/// state, evaluate the attempt, and persist the updated state. The
/// get/evaluate/set sequence for one customer must not interleave with
/// another for the same customer; callers provide that serialization
/// (the pipeline routes each customer to a single worker).
#[derive(Debug, Clone)]
pub struct LoadHandler {
    evaluator: LimitEvaluator,
    store: Arc<AccountStore>,
}

impl LoadHandler {
    pub fn new(evaluator: LimitEvaluator, store: Arc<AccountStore>) -> Self {
        Self { evaluator, store }
    }

    pub fn store(&self) -> &Arc<AccountStore> {
        &self.store
    }

    /// Evaluate one decoded request against its account.
    ///
    /// Returns `None` for a duplicate: no response is emitted and the
    /// stored entry (including its expiry clock) is left untouched.
    /// Accepted and cap-rejected attempts both persist the updated
    /// state and produce a visible response.
    pub fn handle(&self, request: &LoadRequest) -> Option<LoadResponse> {
        let mut state = self
            .store
            .get(&request.customer_id)
            .unwrap_or_else(|| AccountState::new(request.customer_id.clone()));

        let verdict = self.evaluator.evaluate(request, &mut state);
        if verdict.is_duplicate() {
            debug!(
                customer_id = %request.customer_id,
                load_id = %request.id,
                "suppressing response for duplicate load"
            );
            return None;
        }

        self.store.set(state);
        Some(LoadResponse::new(request, verdict.is_accepted()))
    }

    /// Decode one request line and evaluate it.
    ///
    /// `Ok(None)` means a duplicate was swallowed; a decode failure
    /// surfaces as the gateway error for the caller to log and drop.
    pub fn handle_line(&self, line: &str) -> GatewayResult<Option<LoadResponse>> {
        let request = decode_request(line)?;
        Ok(self.handle(&request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use account_store::StoreConfig;
    use chrono::DateTime;
    use velocity_core::VelocityLimits;

    fn handler() -> LoadHandler {
        let store = Arc::new(AccountStore::new(StoreConfig { ttl_secs: 0, purge_interval_secs: 0 }));
        LoadHandler::new(LimitEvaluator::new(VelocityLimits::default()), store)
    }

    fn request(id: &str, customer: &str, amount: &str, time: &str) -> LoadRequest {
        LoadRequest::new(
            id,
            customer,
            amount.parse().unwrap(),
            DateTime::parse_from_rfc3339(time).unwrap(),
        )
    }

    #[test]
    fn accepted_load_produces_accepted_response() {
        let handler = handler();
        let req = request("1", "18", "4000.00", "2020-01-06T10:00:00Z");

        let response = handler.handle(&req).unwrap();
        assert_eq!(response, LoadResponse { id: "1".into(), customer_id: "18".into(), accepted: true });
        assert!(handler.store().get("18").is_some());
    }

    #[test]
    fn cap_rejection_is_visible() {
        let handler = handler();
        handler.handle(&request("1", "18", "4000.00", "2020-01-06T10:00:00Z")).unwrap();

        let response = handler.handle(&request("2", "18", "2000.00", "2020-01-06T11:00:00Z")).unwrap();
        assert!(!response.accepted);
    }

    #[test]
    fn duplicate_is_swallowed() {
        let handler = handler();
        let req = request("1", "18", "4000.00", "2020-01-06T10:00:00Z");

        assert!(handler.handle(&req).is_some());
        assert!(handler.handle(&req).is_none());
    }

    #[test]
    fn state_persists_across_requests() {
        let handler = handler();
        // Three accepted loads exhaust the daily count.
        for id in ["1", "2", "3"] {
            let response =
                handler.handle(&request(id, "528", "10.00", "2020-01-06T10:00:00Z")).unwrap();
            assert!(response.accepted);
        }
        let fourth = handler.handle(&request("4", "528", "10.00", "2020-01-06T10:00:00Z")).unwrap();
        assert!(!fourth.accepted);
    }

    #[test]
    fn expired_state_starts_a_fresh_ledger() {
        let store = Arc::new(AccountStore::new(StoreConfig { ttl_secs: 1, purge_interval_secs: 0 }));
        let handler = LoadHandler::new(LimitEvaluator::new(VelocityLimits::default()), store);

        handler.handle(&request("1", "528", "5000.00", "2020-01-06T10:00:00Z")).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));

        // The ledger aged out, so the same id and a full-cap amount both pass.
        let response = handler.handle(&request("1", "528", "5000.00", "2020-01-06T11:00:00Z")).unwrap();
        assert!(response.accepted);
    }

    #[test]
    fn handle_line_decodes_and_evaluates() {
        let handler = handler();
        let line =
            r#"{"id":"1","customer_id":"18","load_amount":"$4000.00","time":"2020-01-06T10:00:00Z"}"#;

        let response = handler.handle_line(line).unwrap().unwrap();
        assert!(response.accepted);

        // Same line again: duplicate, swallowed.
        assert!(handler.handle_line(line).unwrap().is_none());

        assert!(handler.handle_line("{broken").is_err());
    }
}
