//! Deterministic slot extraction from chat messages.
//!
//! Keyword and token scanning only. The extractor never invents values: a
//! slot it cannot read stays empty and the merge layer keeps whatever the
//! session already knows.

use chrono::{Days, NaiveDate, Utc};

use fareflow_core::domain::session::{SlotUpdate, WEEK_SEARCH};

use crate::cities::CityDirectory;

const CONFIRM_WORDS: [&str; 2] = ["confirm", "finalize"];
const BOOK_WORDS: [&str; 4] = ["book", "reserve", "buy", "purchase"];
const CHEAP_WORDS: [&str; 4] = ["cheap", "cheapest", "lowest", "budget"];
const FAST_WORDS: [&str; 3] = ["fast", "quick", "earliest"];
const CLASS_WORDS: [&str; 3] = ["business", "first", "premium"];

/// Words that end a city phrase when scanning after "from"/"to".
const CITY_STOP_WORDS: [&str; 6] = ["to", "on", "for", "from", "tomorrow", "today"];

#[derive(Clone, Debug, Default)]
pub struct SlotExtractor {
    cities: CityDirectory,
}

impl SlotExtractor {
    pub fn new() -> Self {
        Self { cities: CityDirectory::new() }
    }

    pub fn extract(&self, text: &str) -> SlotUpdate {
        self.extract_with_reference(text, Utc::now().date_naive())
    }

    /// `today` anchors relative dates so tests stay stable.
    pub fn extract_with_reference(&self, text: &str, today: NaiveDate) -> SlotUpdate {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return SlotUpdate::default();
        }
        let lowered = trimmed.to_lowercase();

        let mut update = SlotUpdate {
            intent: extract_intent(&lowered),
            date: extract_date(&lowered, today),
            preference: extract_preference(&lowered),
            ..SlotUpdate::default()
        };

        let cities = self.cities.find_in_text(&lowered);
        match cities.as_slice() {
            [from, to, ..] => {
                update.from = (*from).to_owned();
                update.to = (*to).to_owned();
            }
            [only] => {
                if lowered.contains("from") {
                    update.from = (*only).to_owned();
                } else {
                    update.to = (*only).to_owned();
                }
            }
            [] => {
                update.error_message = self.unknown_city_message(&lowered);
            }
        }

        update
    }

    /// When no city matched but the message names one after "from"/"to",
    /// offer spelling corrections.
    fn unknown_city_message(&self, lowered: &str) -> Option<String> {
        let candidate = city_candidate(lowered)?;
        let suggestions = self.cities.suggest_similar(&candidate);
        if suggestions.is_empty() {
            return None;
        }

        let mut options: Vec<String> = suggestions
            .iter()
            .map(|city| {
                let mut chars = city.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect();
        let options = match options.len() {
            1 => options.remove(0),
            _ => options.join(", "),
        };
        Some(format!("I don't recognize \"{candidate}\". Did you mean {options}?"))
    }
}

fn extract_intent(lowered: &str) -> String {
    if CONFIRM_WORDS.iter().any(|word| lowered.contains(word)) {
        return "confirm".to_owned();
    }
    let mentions_flight = lowered.contains("flight") || lowered.contains("ticket");
    if mentions_flight && BOOK_WORDS.iter().any(|word| lowered.contains(word)) {
        return "book_flight".to_owned();
    }
    "search_flights".to_owned()
}

fn extract_preference(lowered: &str) -> String {
    if CHEAP_WORDS.iter().any(|word| lowered.contains(word)) {
        "cheapest".to_owned()
    } else if FAST_WORDS.iter().any(|word| lowered.contains(word)) {
        "earliest".to_owned()
    } else if CLASS_WORDS.iter().any(|word| lowered.contains(word)) {
        "business".to_owned()
    } else {
        String::new()
    }
}

fn extract_date(lowered: &str, today: NaiveDate) -> String {
    // Longest phrase first, otherwise "tomorrow" shadows "day after tomorrow".
    if lowered.contains("day after tomorrow") {
        return iso(today.checked_add_days(Days::new(2)));
    }
    if lowered.contains("tomorrow") {
        return iso(today.checked_add_days(Days::new(1)));
    }
    if lowered.contains("today") {
        return today.format("%Y-%m-%d").to_string();
    }
    if lowered.contains("next week") || lowered.contains("this weekend") {
        return WEEK_SEARCH.to_owned();
    }

    lowered
        .split_whitespace()
        .find(|token| NaiveDate::parse_from_str(token, "%Y-%m-%d").is_ok())
        .map(str::to_owned)
        .unwrap_or_default()
}

fn iso(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

/// The word(s) following "from" or "to", up to a stop word or digit.
fn city_candidate(lowered: &str) -> Option<String> {
    let tokens: Vec<&str> = lowered.split_whitespace().collect();
    for marker in ["from", "to"] {
        let Some(position) = tokens.iter().position(|token| *token == marker) else {
            continue;
        };
        let phrase: Vec<&str> = tokens[position + 1..]
            .iter()
            .take_while(|token| {
                !CITY_STOP_WORDS.contains(token)
                    && token.chars().all(|ch| ch.is_ascii_alphabetic())
            })
            .copied()
            .collect();
        if !phrase.is_empty() {
            return Some(phrase.join(" "));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::SlotExtractor;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 1).unwrap_or_default()
    }

    fn extract(text: &str) -> fareflow_core::domain::session::SlotUpdate {
        SlotExtractor::new().extract_with_reference(text, today())
    }

    #[test]
    fn full_request_fills_every_slot() {
        let update = extract("find cheapest flights from mumbai to delhi tomorrow");

        assert_eq!(update.intent, "search_flights");
        assert_eq!(update.from, "mumbai");
        assert_eq!(update.to, "delhi");
        assert_eq!(update.date, "2026-09-02");
        assert_eq!(update.preference, "cheapest");
        assert_eq!(update.error_message, None);
    }

    #[test]
    fn empty_message_yields_empty_update() {
        let update = extract("   ");
        assert_eq!(update, fareflow_core::domain::session::SlotUpdate::default());
    }

    #[test]
    fn intent_extraction_cases() {
        let cases = [
            ("confirm the booking", "confirm"),
            ("please finalize my reservation", "confirm"),
            ("book a flight to goa", "book_flight"),
            ("buy tickets for tomorrow", "book_flight"),
            ("show me flights to delhi", "search_flights"),
            ("hello there", "search_flights"),
        ];
        for (text, expected) in cases {
            assert_eq!(extract(text).intent, expected, "text: {text}");
        }
    }

    #[test]
    fn single_city_with_from_marker_is_origin() {
        let update = extract("flying from chennai");
        assert_eq!(update.from, "chennai");
        assert_eq!(update.to, "");
    }

    #[test]
    fn single_city_without_marker_is_destination() {
        let update = extract("flights bangalore please");
        assert_eq!(update.from, "");
        assert_eq!(update.to, "bangalore");
    }

    #[test]
    fn aliases_resolve_to_canonical_cities() {
        let update = extract("bombay to calcutta next week");
        assert_eq!(update.from, "mumbai");
        assert_eq!(update.to, "kolkata");
        assert_eq!(update.date, "WEEK_SEARCH");
    }

    #[test]
    fn relative_dates_resolve_against_reference_day() {
        assert_eq!(extract("leave today").date, "2026-09-01");
        assert_eq!(extract("leave tomorrow").date, "2026-09-02");
        assert_eq!(extract("leave day after tomorrow").date, "2026-09-03");
    }

    #[test]
    fn explicit_iso_dates_pass_through() {
        assert_eq!(extract("mumbai to delhi on 2026-10-15").date, "2026-10-15");
        assert_eq!(extract("mumbai to delhi on 15/10").date, "");
    }

    #[test]
    fn preference_keywords_map_to_buckets() {
        assert_eq!(extract("lowest fare please").preference, "cheapest");
        assert_eq!(extract("quickest option").preference, "earliest");
        assert_eq!(extract("premium cabin").preference, "business");
        assert_eq!(extract("mumbai to delhi").preference, "");
    }

    #[test]
    fn misspelled_city_produces_a_suggestion_message() {
        let update = extract("flights from mumbia");
        let message = update.error_message.unwrap_or_default();
        assert!(message.contains("mumbia"), "message: {message}");
        assert!(message.contains("Mumbai"), "message: {message}");
    }

    #[test]
    fn gibberish_after_marker_stays_silent() {
        let update = extract("flights from xqzzw");
        assert_eq!(update.error_message, None);
    }
}
