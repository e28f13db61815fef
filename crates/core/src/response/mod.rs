//! Reply Assembly
//!
//! Turns pipeline outcomes into user-facing text, flight cards, and
//! suggested follow-up actions. All strings the chat surface shows live
//! here, so transports stay presentation-free.

mod cards;

pub use cards::{build_cards, FlightCard};

use serde::{Deserialize, Serialize};

use crate::domain::flight::ReconciledFlight;
use crate::domain::session::{BookingStage, SessionContext, WEEK_SEARCH};

/// Reply used when a turn fails outright.
pub const ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// Actions offered alongside [`ERROR_REPLY`].
pub const ERROR_ACTIONS: [&str; 2] = ["Try again", "Start over"];

/// Slot values the user has pinned down so far, echoed back on every turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSummary {
    pub intent: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub preference: Option<String>,
    pub booking_stage: Option<BookingStage>,
}

#[derive(Clone, Debug, Default)]
pub struct ResponseAssembler;

impl ResponseAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Asks for whatever is still missing, most specific question first.
    pub fn prompt_for_missing_slots(&self, context: &SessionContext) -> String {
        let missing = context.missing_slots();
        if missing.contains(&"from") && missing.contains(&"to") {
            return "Where would you like to fly from and to? (From → To)".to_owned();
        }
        if missing.contains(&"date") {
            return "When would you like to travel? You can specify a date (e.g., 'tomorrow', \
                    'next Friday') or I can show you the best options for the next week."
                .to_owned();
        }
        "Please provide flight details: From, To, Date.".to_owned()
    }

    pub fn flight_cards(&self, flights: &[ReconciledFlight]) -> Vec<FlightCard> {
        build_cards(flights)
    }

    /// One-line search summary. Tone scales with how many options came back
    /// and whether the user asked for something specific.
    pub fn flight_summary(&self, context: &SessionContext, cards: &[FlightCard]) -> String {
        if cards.is_empty() {
            return "No flights found. Would you like to try a different time or airline?"
                .to_owned();
        }

        let cheapest = cards.iter().map(|c| c.price).min().unwrap_or(0);
        let most_expensive = cards.iter().map(|c| c.price).max().unwrap_or(0);
        let range = format!(
            "₹{} - ₹{}",
            cards::format_thousands(cheapest),
            cards::format_thousands(most_expensive)
        );

        let from_city = title_case(context.from.as_deref().unwrap_or_default());
        let to_city = title_case(context.to.as_deref().unwrap_or_default());
        let preference = context.preference.as_deref().unwrap_or_default();
        let date = context.date.as_deref().unwrap_or_default();
        let count = cards.len();

        if date.is_empty() || date == WEEK_SEARCH {
            let when = "across multiple dates";
            if preference.to_lowercase().contains("cheap") {
                format!("Found {count} cheapest flights from {from_city} to {to_city} {when} | {range}")
            } else if count == 1 {
                format!(
                    "Perfect! Found 1 flight from {from_city} to {to_city} {when} for ₹{}",
                    cards::format_thousands(cheapest)
                )
            } else if count <= 3 {
                format!("Great! Found {count} flights from {from_city} to {to_city} {when} | {range}")
            } else {
                format!(
                    "Found {count} flight options from {from_city} to {to_city} {when} | {range}"
                )
            }
        } else if !preference.is_empty() {
            format!(
                "Found {count} {} flights from {from_city} to {to_city} on {date} | {range}",
                preference.to_lowercase()
            )
        } else if count == 1 {
            format!(
                "Perfect! Found 1 flight from {from_city} to {to_city} on {date} for ₹{}",
                cards::format_thousands(cheapest)
            )
        } else if count <= 3 {
            format!("Great! Found {count} flights from {from_city} to {to_city} on {date} | {range}")
        } else {
            format!("Found {count} flight options from {from_city} to {to_city} on {date} | {range}")
        }
    }

    pub fn payment_prompt(&self, upi_link: &str) -> String {
        format!("Ready to pay? Tap UPI link: {upi_link}")
    }

    pub fn confirmation(&self, pnr: &str, route: &str, date: &str) -> String {
        format!("Booked! PNR {pnr}. Route {route} on {date}. Ticket and receipt sent. ✈️")
    }

    pub fn state_summary(&self, context: &SessionContext) -> StateSummary {
        StateSummary {
            intent: context.intent.clone(),
            from: context.from.clone(),
            to: context.to.clone(),
            date: context.date.clone(),
            preference: context.preference.clone(),
            booking_stage: context.booking_stage,
        }
    }

    /// Compact "🛫 mumbai → delhi | 📅 2026-09-05 | ✨ Cheapest" chip for the
    /// UI header. Empty when nothing is known yet.
    pub fn context_chip(&self, context: &SessionContext) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let (Some(from), Some(to)) = (context.from.as_deref(), context.to.as_deref()) {
            parts.push(format!("🛫 {from} → {to}"));
        }
        if let Some(date) = context.date.as_deref() {
            parts.push(format!("📅 {date}"));
        }
        if let Some(preference) = context.preference.as_deref() {
            parts.push(format!("✨ {}", title_case(preference)));
        }
        parts.join(" | ")
    }

    pub fn suggested_actions(&self, context: &SessionContext) -> Vec<String> {
        let actions: &[&str] = match context.booking_stage {
            Some(BookingStage::Review) => &["Confirm & Pay", "Change date", "Change destination"],
            None | Some(BookingStage::CollectSlots) => &["Set date to tomorrow", "Evening flights"],
            Some(BookingStage::Payment) => &["Retry payment", "Change payment method"],
            _ => &[],
        };
        actions.iter().map(|&a| a.to_owned()).collect()
    }

    pub fn safe_fallback(&self) -> String {
        "I didn't understand. Please provide flight details (From, To, Date).".to_owned()
    }
}

/// Uppercases the first letter of each whitespace-separated word and
/// lowercases the rest, so "new delhi" renders as "New Delhi".
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
