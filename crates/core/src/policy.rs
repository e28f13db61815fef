//! Turn-level decision policy.
//!
//! Given the merged session context, picks exactly one action for this turn.
//! The checks run in a fixed order and the order matters: a fully specified
//! search request wins over whatever stage the booking machine is in, which
//! lets "actually, Delhi to Goa tomorrow" re-run a search from the payment
//! screen.

use serde::{Deserialize, Serialize};

use crate::domain::session::{BookingStage, SessionContext};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    PromptMissing,
    SearchFlights,
    RequestPayment,
    Confirm,
}

pub fn decide_next_action(context: &SessionContext) -> NextAction {
    if context.has_all_search_slots() {
        return NextAction::SearchFlights;
    }

    if !context.missing_slots().is_empty() {
        return NextAction::PromptMissing;
    }

    match context.booking_stage {
        None | Some(BookingStage::CollectSlots) => NextAction::PromptMissing,
        Some(BookingStage::Search) => NextAction::SearchFlights,
        Some(BookingStage::Review) => {
            if context.intent.as_deref() == Some("confirm") {
                NextAction::RequestPayment
            } else {
                NextAction::SearchFlights
            }
        }
        Some(BookingStage::Payment) => {
            if context.payment_confirmed {
                NextAction::Confirm
            } else {
                NextAction::RequestPayment
            }
        }
        Some(BookingStage::Confirmed) => NextAction::PromptMissing,
    }
}

#[cfg(test)]
mod tests {
    use super::{decide_next_action, NextAction};
    use crate::domain::session::{BookingStage, SessionContext};

    fn context(intent: &str, from: &str, to: &str, date: &str) -> SessionContext {
        let some = |value: &str| {
            if value.is_empty() {
                None
            } else {
                Some(value.to_owned())
            }
        };
        SessionContext {
            intent: some(intent),
            from: some(from),
            to: some(to),
            date: some(date),
            ..SessionContext::default()
        }
    }

    #[test]
    fn complete_slots_trigger_search() {
        let ctx = context("search_flights", "mumbai", "delhi", "2026-09-05");
        assert_eq!(decide_next_action(&ctx), NextAction::SearchFlights);
    }

    #[test]
    fn each_missing_slot_triggers_prompt() {
        let cases = [
            context("", "mumbai", "delhi", "2026-09-05"),
            context("search_flights", "", "delhi", "2026-09-05"),
            context("search_flights", "mumbai", "", "2026-09-05"),
            context("search_flights", "mumbai", "delhi", ""),
            SessionContext::default(),
        ];
        for ctx in cases {
            assert_eq!(decide_next_action(&ctx), NextAction::PromptMissing);
        }
    }

    #[test]
    fn whitespace_slot_counts_as_missing() {
        let mut ctx = context("search_flights", "mumbai", "delhi", "2026-09-05");
        ctx.date = Some("   ".to_owned());
        assert_eq!(decide_next_action(&ctx), NextAction::PromptMissing);
    }

    #[test]
    fn all_slots_present_bypasses_payment_stage() {
        let mut ctx = context("search_flights", "mumbai", "delhi", "2026-09-05");
        ctx.booking_stage = Some(BookingStage::Payment);
        ctx.payment_confirmed = true;

        assert_eq!(decide_next_action(&ctx), NextAction::SearchFlights);
    }

    #[test]
    fn all_slots_present_bypasses_review_stage() {
        let mut ctx = context("confirm", "mumbai", "delhi", "2026-09-05");
        ctx.booking_stage = Some(BookingStage::Review);

        assert_eq!(decide_next_action(&ctx), NextAction::SearchFlights);
    }

    #[test]
    fn decision_is_deterministic_for_equal_contexts() {
        let ctx = context("search_flights", "mumbai", "delhi", "2026-09-05");
        let first = decide_next_action(&ctx);
        for _ in 0..5 {
            assert_eq!(decide_next_action(&ctx), first);
        }
    }
}
