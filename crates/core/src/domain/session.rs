use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Sentinel date meaning "search across the coming week" rather than one day.
pub const WEEK_SEARCH: &str = "WEEK_SEARCH";

/// Slots that must be filled before a search can be dispatched.
pub const REQUIRED_SLOTS: [&str; 4] = ["intent", "from", "to", "date"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStage {
    CollectSlots,
    Search,
    Review,
    Payment,
    Confirmed,
}

impl BookingStage {
    fn order(self) -> u8 {
        match self {
            Self::CollectSlots => 0,
            Self::Search => 1,
            Self::Review => 2,
            Self::Payment => 3,
            Self::Confirmed => 4,
        }
    }
}

/// Slot values extracted from a single user message. Empty strings mean the
/// message said nothing about that slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub intent: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub preference: String,
    /// Set when extraction recognized a problem worth telling the user about,
    /// such as an unknown city with close matches to suggest.
    pub error_message: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub intent: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub preference: Option<String>,
    pub booking_stage: Option<BookingStage>,
    pub payment_confirmed: bool,
    pub last_results_count: Option<usize>,
    pub last_updated: DateTime<Utc>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            intent: None,
            from: None,
            to: None,
            date: None,
            preference: None,
            booking_stage: None,
            payment_confirmed: false,
            last_results_count: None,
            last_updated: Utc::now(),
        }
    }
}

impl SessionContext {
    /// Merges a per-message update into the accumulated context. A slot is
    /// overwritten only when the update carries a non-empty value for it, so
    /// "tomorrow instead" keeps the route collected two messages ago.
    pub fn apply(&mut self, update: &SlotUpdate) {
        apply_slot(&mut self.intent, &update.intent);
        apply_slot(&mut self.from, &update.from);
        apply_slot(&mut self.to, &update.to);
        apply_slot(&mut self.date, &update.date);
        apply_slot(&mut self.preference, &update.preference);
        self.last_updated = Utc::now();
    }

    /// Builds a fresh context from a single update. Used as the degraded path
    /// when the session store cannot be read.
    pub fn from_update(update: &SlotUpdate) -> Self {
        let mut context = Self::default();
        context.apply(update);
        context
    }

    pub fn slot_filled(value: &Option<String>) -> bool {
        value.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    pub fn has_all_search_slots(&self) -> bool {
        Self::slot_filled(&self.intent)
            && Self::slot_filled(&self.from)
            && Self::slot_filled(&self.to)
            && Self::slot_filled(&self.date)
    }

    pub fn missing_slots(&self) -> Vec<&'static str> {
        let slots = [
            ("intent", &self.intent),
            ("from", &self.from),
            ("to", &self.to),
            ("date", &self.date),
        ];
        slots
            .into_iter()
            .filter(|(_, value)| !Self::slot_filled(value))
            .map(|(name, _)| name)
            .collect()
    }

    /// The booking stage only moves forward. Re-entering an earlier stage
    /// requires an explicit [`restart`](Self::restart).
    pub fn advance_stage(&mut self, next: BookingStage) -> Result<(), DomainError> {
        if let Some(current) = self.booking_stage {
            if next.order() < current.order() {
                return Err(DomainError::InvalidStageTransition { from: current, to: next });
            }
        }
        self.booking_stage = Some(next);
        Ok(())
    }

    /// Drops booking progress but keeps nothing else either: a restart is a
    /// brand-new conversation under the same session id.
    pub fn restart(&mut self) {
        *self = Self::default();
    }
}

fn apply_slot(slot: &mut Option<String>, value: &str) {
    let trimmed = value.trim();
    if !trimmed.is_empty() {
        *slot = Some(trimmed.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::{BookingStage, SessionContext, SlotUpdate};

    fn update(intent: &str, from: &str, to: &str, date: &str, preference: &str) -> SlotUpdate {
        SlotUpdate {
            intent: intent.to_owned(),
            from: from.to_owned(),
            to: to.to_owned(),
            date: date.to_owned(),
            preference: preference.to_owned(),
            error_message: None,
        }
    }

    #[test]
    fn empty_update_values_keep_earlier_slots() {
        let mut context = SessionContext::default();
        context.apply(&update("search_flights", "mumbai", "delhi", "", ""));
        context.apply(&update("search_flights", "", "", "2026-09-05", ""));

        assert_eq!(context.from.as_deref(), Some("mumbai"));
        assert_eq!(context.to.as_deref(), Some("delhi"));
        assert_eq!(context.date.as_deref(), Some("2026-09-05"));
    }

    #[test]
    fn non_empty_update_values_overwrite_earlier_slots() {
        let mut context = SessionContext::default();
        context.apply(&update("search_flights", "mumbai", "delhi", "2026-09-05", ""));
        context.apply(&update("search_flights", "", "goa", "", "cheapest"));

        assert_eq!(context.from.as_deref(), Some("mumbai"));
        assert_eq!(context.to.as_deref(), Some("goa"));
        assert_eq!(context.preference.as_deref(), Some("cheapest"));
    }

    #[test]
    fn whitespace_only_values_do_not_overwrite() {
        let mut context = SessionContext::default();
        context.apply(&update("search_flights", "mumbai", "delhi", "2026-09-05", ""));
        context.apply(&update("", "   ", "", "", ""));

        assert_eq!(context.from.as_deref(), Some("mumbai"));
        assert_eq!(context.intent.as_deref(), Some("search_flights"));
    }

    #[test]
    fn missing_slots_reports_unfilled_required_slots() {
        let mut context = SessionContext::default();
        context.apply(&update("search_flights", "mumbai", "", "", ""));

        assert_eq!(context.missing_slots(), vec!["to", "date"]);
        assert!(!context.has_all_search_slots());
    }

    #[test]
    fn stage_advances_forward_and_holds_in_place() {
        let mut context = SessionContext::default();
        context.advance_stage(BookingStage::Search).expect("none -> search");
        context.advance_stage(BookingStage::Review).expect("search -> review");
        context.advance_stage(BookingStage::Review).expect("review -> review");

        assert_eq!(context.booking_stage, Some(BookingStage::Review));
    }

    #[test]
    fn stage_cannot_move_backward() {
        let mut context = SessionContext::default();
        context.advance_stage(BookingStage::Payment).expect("none -> payment");
        let error = context
            .advance_stage(BookingStage::Search)
            .expect_err("payment -> search should fail");

        assert!(matches!(
            error,
            crate::errors::DomainError::InvalidStageTransition { .. }
        ));
    }

    #[test]
    fn restart_clears_all_progress() {
        let mut context = SessionContext::default();
        context.apply(&update("search_flights", "mumbai", "delhi", "2026-09-05", ""));
        context.advance_stage(BookingStage::Payment).expect("stage");
        context.restart();

        assert_eq!(context.booking_stage, None);
        assert_eq!(context.from, None);
        assert!(!context.payment_confirmed);
    }
}
