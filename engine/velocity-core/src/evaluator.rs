//! Fixed-order evaluation of one load attempt against an account ledger

use tracing::debug;

use crate::config::VelocityLimits;
use crate::ledger::AccountState;
use crate::types::{LoadRequest, RecordedLoad, RejectReason, Verdict};

/// Applies the configured velocity caps to load attempts.
///
/// The evaluator is stateless between calls; all history lives in the
/// [`AccountState`] handed to [`evaluate`](LimitEvaluator::evaluate).
#[derive(Debug, Clone, Default)]
pub struct LimitEvaluator {
    limits: VelocityLimits,
}

impl LimitEvaluator {
    /// Limits are trusted here; validate them at configuration load.
    pub fn new(limits: VelocityLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &VelocityLimits {
        &self.limits
    }

    /// Evaluate one attempt and fold the outcome into `state`.
    ///
    /// Checks run in a fixed order: duplicate id, daily count, daily
    /// amount, weekly amount. A duplicate leaves the state untouched.
    /// Every fresh attempt id is remembered even when a cap rejects
    /// the load; only accepted loads count toward the caps.
    pub fn evaluate(&self, request: &LoadRequest, state: &mut AccountState) -> Verdict {
        debug_assert_eq!(request.customer_id, state.customer_id());

        if state.has_seen(&request.id) {
            debug!(
                customer_id = %request.customer_id,
                load_id = %request.id,
                "duplicate load attempt ignored"
            );
            return Verdict::Duplicate;
        }
        state.note_attempt(request.id.clone());

        let rejection = self.check_daily(request, state).or_else(|| self.check_weekly(request, state));
        if let Some(reason) = rejection {
            debug!(
                customer_id = %request.customer_id,
                load_id = %request.id,
                amount = %request.amount,
                reason = reason.as_str(),
                "load rejected by velocity cap"
            );
            return Verdict::Rejected(reason);
        }

        state.record(RecordedLoad::from(request));
        Verdict::Accepted
    }

    /// Count cap first, then the amount cap. Sums cover already
    /// accepted loads only; the attempt under evaluation is added on
    /// top for the comparison. An amount so large the sum overflows
    /// is past any cap, so overflow rejects rather than panics.
    fn check_daily(&self, request: &LoadRequest, state: &AccountState) -> Option<RejectReason> {
        let day = request.day_key();
        if state.count_on(day) >= self.limits.daily_load_count as usize {
            return Some(RejectReason::DailyLoadCount);
        }
        // A total landing exactly on the cap is still acceptable.
        let day_total = state.total_on(day).checked_add(request.amount);
        if day_total.map_or(true, |total| total > self.limits.daily_amount_cap) {
            return Some(RejectReason::DailyAmount);
        }
        None
    }

    fn check_weekly(&self, request: &LoadRequest, state: &AccountState) -> Option<RejectReason> {
        let week_total = state.week_to_date_total(request.day_key()).checked_add(request.amount);
        if week_total.map_or(true, |total| total > self.limits.weekly_amount_cap) {
            return Some(RejectReason::WeeklyAmount);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use rust_decimal::Decimal;

    fn request(id: &str, amount: &str, time: &str) -> LoadRequest {
        LoadRequest::new(
            id,
            "528",
            amount.parse().unwrap(),
            DateTime::parse_from_rfc3339(time).unwrap(),
        )
    }

    fn evaluator() -> LimitEvaluator {
        LimitEvaluator::new(VelocityLimits::default())
    }

    #[test]
    fn accepts_within_all_caps() {
        let eval = evaluator();
        let mut state = AccountState::new("528");
        let req = request("1", "4000.00", "2020-01-06T10:00:00Z");

        assert_eq!(eval.evaluate(&req, &mut state), Verdict::Accepted);
        assert_eq!(state.count_on(req.day_key()), 1);
        assert_eq!(state.total_on(req.day_key()), "4000.00".parse().unwrap());
    }

    #[test]
    fn duplicate_id_is_swallowed_without_state_change() {
        let eval = evaluator();
        let mut state = AccountState::new("528");
        let req = request("1", "4000.00", "2020-01-06T10:00:00Z");

        assert_eq!(eval.evaluate(&req, &mut state), Verdict::Accepted);
        let after_first = state.clone();

        assert_eq!(eval.evaluate(&req, &mut state), Verdict::Duplicate);
        assert_eq!(state, after_first);
    }

    #[test]
    fn rejected_attempt_id_still_blocks_resubmission() {
        let eval = evaluator();
        let mut state = AccountState::new("528");

        let too_big = request("9", "5000.01", "2020-01-06T10:00:00Z");
        assert_eq!(
            eval.evaluate(&too_big, &mut state),
            Verdict::Rejected(RejectReason::DailyAmount)
        );
        assert_eq!(state.count_on(too_big.day_key()), 0);

        // Same id again, now with a harmless amount: the id is burned.
        let retry = request("9", "1.00", "2020-01-06T11:00:00Z");
        assert_eq!(eval.evaluate(&retry, &mut state), Verdict::Duplicate);
    }

    #[test]
    fn fourth_load_of_the_day_is_rejected_regardless_of_amount() {
        let eval = evaluator();
        let mut state = AccountState::new("528");

        for id in ["1", "2", "3"] {
            let req = request(id, "10.00", "2020-01-06T10:00:00Z");
            assert_eq!(eval.evaluate(&req, &mut state), Verdict::Accepted);
        }

        let fourth = request("4", "0.01", "2020-01-06T20:00:00Z");
        assert_eq!(
            eval.evaluate(&fourth, &mut state),
            Verdict::Rejected(RejectReason::DailyLoadCount)
        );

        // The next calendar day opens a fresh count window.
        let next_day = request("5", "0.01", "2020-01-07T00:00:00Z");
        assert_eq!(eval.evaluate(&next_day, &mut state), Verdict::Accepted);
    }

    #[test]
    fn daily_amount_boundary_is_exact() {
        let eval = evaluator();
        let mut state = AccountState::new("528");

        let near_cap = request("1", "4999.99", "2020-01-06T10:00:00Z");
        assert_eq!(eval.evaluate(&near_cap, &mut state), Verdict::Accepted);

        // 4999.99 + 0.02 = 5000.01 > cap
        let over = request("2", "0.02", "2020-01-06T11:00:00Z");
        assert_eq!(eval.evaluate(&over, &mut state), Verdict::Rejected(RejectReason::DailyAmount));

        // 4999.99 + 0.01 = 5000.00, exactly the cap
        let exact = request("3", "0.01", "2020-01-06T12:00:00Z");
        assert_eq!(eval.evaluate(&exact, &mut state), Verdict::Accepted);
        assert_eq!(state.total_on(exact.day_key()), Decimal::new(500_000, 2));
    }

    #[test]
    fn weekly_amount_boundary_is_exact() {
        let eval = evaluator();
        let mut state = AccountState::new("528");

        // Pre-recorded history: 10000 on Monday, 10000 on Tuesday.
        state.record(RecordedLoad::new(
            "a",
            "10000.00".parse().unwrap(),
            DateTime::parse_from_rfc3339("2020-01-06T09:00:00Z").unwrap(),
        ));
        state.record(RecordedLoad::new(
            "b",
            "10000.00".parse().unwrap(),
            DateTime::parse_from_rfc3339("2020-01-07T09:00:00Z").unwrap(),
        ));

        // Sunday of the same week: one cent over the 20000.00 cap.
        let over = request("1", "0.01", "2020-01-12T10:00:00Z");
        assert_eq!(eval.evaluate(&over, &mut state), Verdict::Rejected(RejectReason::WeeklyAmount));

        // Exactly at the cap is fine.
        let at_cap = request("2", "0.00", "2020-01-12T11:00:00Z");
        assert_eq!(eval.evaluate(&at_cap, &mut state), Verdict::Accepted);

        // The following Monday the window resets.
        let next_week = request("3", "4000.00", "2020-01-13T09:00:00Z");
        assert_eq!(eval.evaluate(&next_week, &mut state), Verdict::Accepted);
    }

    #[test]
    fn acceptance_depends_on_submission_order() {
        let eval = evaluator();
        let a = request("a", "3000.00", "2020-01-06T10:00:00Z");
        let b = request("b", "2500.00", "2020-01-06T11:00:00Z");

        let mut a_first = AccountState::new("528");
        assert_eq!(eval.evaluate(&a, &mut a_first), Verdict::Accepted);
        assert_eq!(eval.evaluate(&b, &mut a_first), Verdict::Rejected(RejectReason::DailyAmount));

        let mut b_first = AccountState::new("528");
        assert_eq!(eval.evaluate(&b, &mut b_first), Verdict::Accepted);
        assert_eq!(eval.evaluate(&a, &mut b_first), Verdict::Rejected(RejectReason::DailyAmount));
    }

    #[test]
    fn daily_count_outranks_daily_amount() {
        let eval = evaluator();
        let mut state = AccountState::new("528");

        for id in ["1", "2", "3"] {
            let req = request(id, "1600.00", "2020-01-06T10:00:00Z");
            assert_eq!(eval.evaluate(&req, &mut state), Verdict::Accepted);
        }

        // Both caps would reject; the count check runs first.
        let fourth = request("4", "1000.00", "2020-01-06T20:00:00Z");
        assert_eq!(
            eval.evaluate(&fourth, &mut state),
            Verdict::Rejected(RejectReason::DailyLoadCount)
        );
    }

    #[test]
    fn sunday_attempt_sees_full_week_history() {
        let eval = evaluator();
        let mut state = AccountState::new("528");

        // 5000 on each of Mon/Tue/Wed/Thu fills the weekly cap.
        for (id, day) in [("1", "06"), ("2", "07"), ("3", "08"), ("4", "09")] {
            let req = request(id, "5000.00", &format!("2020-01-{day}T10:00:00Z"));
            assert_eq!(eval.evaluate(&req, &mut state), Verdict::Accepted);
        }

        let sunday = request("5", "0.01", "2020-01-12T10:00:00Z");
        assert_eq!(
            eval.evaluate(&sunday, &mut state),
            Verdict::Rejected(RejectReason::WeeklyAmount)
        );
    }

    #[test]
    fn huge_amount_rejects_instead_of_overflowing_daily_sum() {
        let eval = evaluator();
        let mut state = AccountState::new("528");

        let first = request("1", "4000.00", "2020-01-06T10:00:00Z");
        assert_eq!(eval.evaluate(&first, &mut state), Verdict::Accepted);

        // The wire only guards parseability and sign, so an amount this
        // large is reachable; summing it with any history overflows.
        let huge = LoadRequest::new(
            "2",
            "528",
            Decimal::MAX,
            DateTime::parse_from_rfc3339("2020-01-06T11:00:00Z").unwrap(),
        );
        assert_eq!(eval.evaluate(&huge, &mut state), Verdict::Rejected(RejectReason::DailyAmount));
        assert_eq!(state.count_on(huge.day_key()), 1);
    }

    #[test]
    fn huge_amount_rejects_instead_of_overflowing_weekly_sum() {
        // A daily cap wide enough that the daily check passes, so the
        // overflow can only surface in the weekly comparison.
        let eval = LimitEvaluator::new(VelocityLimits {
            daily_amount_cap: Decimal::MAX,
            weekly_amount_cap: Decimal::MAX,
            ..Default::default()
        });
        let mut state = AccountState::new("528");

        state.record(RecordedLoad::new(
            "a",
            "10000.00".parse().unwrap(),
            DateTime::parse_from_rfc3339("2020-01-06T09:00:00Z").unwrap(),
        ));

        let huge = LoadRequest::new(
            "1",
            "528",
            Decimal::MAX,
            DateTime::parse_from_rfc3339("2020-01-07T10:00:00Z").unwrap(),
        );
        assert_eq!(eval.evaluate(&huge, &mut state), Verdict::Rejected(RejectReason::WeeklyAmount));
    }

    #[test]
    fn end_to_end_scenario_for_one_customer() {
        let eval = evaluator();
        let mut state = AccountState::new("18");

        let first = LoadRequest::new(
            "1",
            "18",
            "4000.00".parse().unwrap(),
            DateTime::parse_from_rfc3339("2020-01-06T10:00:00Z").unwrap(),
        );
        assert_eq!(eval.evaluate(&first, &mut state), Verdict::Accepted);

        let second = LoadRequest::new(
            "2",
            "18",
            "2000.00".parse().unwrap(),
            DateTime::parse_from_rfc3339("2020-01-06T11:00:00Z").unwrap(),
        );
        assert_eq!(eval.evaluate(&second, &mut state), Verdict::Rejected(RejectReason::DailyAmount));

        assert_eq!(eval.evaluate(&first, &mut state), Verdict::Duplicate);
    }
}
