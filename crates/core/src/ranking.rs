//! Preference-aware ordering of reconciled flights.

use crate::domain::flight::ReconciledFlight;

/// Preference words that mean "sort by price".
pub const PRICE_KEYWORDS: [&str; 5] = ["cheap", "cheapest", "lowest", "budget", "affordable"];

/// Departure key used when a flight's time string is empty, so timeless
/// flights sort last under a time preference.
const LAST_DEPARTURE: &str = "23:59";

#[derive(Clone, Debug)]
pub struct Ranker {
    display_limit: usize,
}

impl Default for Ranker {
    fn default() -> Self {
        Self { display_limit: 3 }
    }
}

impl Ranker {
    pub fn new(display_limit: usize) -> Self {
        Self { display_limit }
    }

    /// Orders flights by the user's stated preference and truncates to the
    /// display limit. No preference means cheapest first.
    pub fn rank(
        &self,
        mut flights: Vec<ReconciledFlight>,
        preference: Option<&str>,
    ) -> Vec<ReconciledFlight> {
        match preference.map(str::trim).filter(|p| !p.is_empty()) {
            Some(preference) if is_price_preference(preference) => {
                flights.sort_by_key(|flight| flight.price);
            }
            Some(_) => {
                flights.sort_by(|a, b| {
                    (departure_key(a), a.price).cmp(&(departure_key(b), b.price))
                });
            }
            None => {
                flights.sort_by_key(|flight| flight.price);
            }
        }
        flights.truncate(self.display_limit);
        flights
    }
}

fn is_price_preference(preference: &str) -> bool {
    let lowered = preference.to_lowercase();
    PRICE_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

fn departure_key(flight: &ReconciledFlight) -> &str {
    if flight.departure_time.trim().is_empty() {
        LAST_DEPARTURE
    } else {
        &flight.departure_time
    }
}
