//! UI flight card assembly

use serde::{Deserialize, Serialize};

use crate::domain::flight::{DataQuality, ReconciledFlight};

/// Renderable card for one flight, with branding and badge flags resolved.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightCard {
    pub id: String,
    pub airline: String,
    pub airline_name: String,
    pub airline_color: String,
    pub code: String,
    pub time: String,
    pub price: i64,
    pub formatted_price: String,
    pub duration: String,
    pub stops: String,
    pub stops_count: u32,
    #[serde(rename = "class")]
    pub fare_class: String,
    pub class_icon: String,
    pub class_color: String,
    pub source: String,
    pub confidence: f64,
    pub data_quality: DataQuality,
    pub is_direct: bool,
    pub is_cheapest: bool,
    pub is_fastest: bool,
    pub booking_url: String,
}

/// Cards sorted cheapest-first, with the cheapest and fastest flagged.
pub fn build_cards(flights: &[ReconciledFlight]) -> Vec<FlightCard> {
    let mut cards: Vec<FlightCard> = flights.iter().map(build_card).collect();
    cards.sort_by_key(|card| card.price);

    if let Some(first) = cards.first_mut() {
        first.is_cheapest = true;
    }
    if let Some(index) = fastest_index(&cards) {
        cards[index].is_fastest = true;
    }
    cards
}

fn build_card(flight: &ReconciledFlight) -> FlightCard {
    let (fare_class, class_icon, class_color) = fare_class_for(flight.price);
    let (airline_color, airline_name) = airline_brand(&flight.airline);
    let stops_text = stops_text(flight.stops);

    FlightCard {
        id: format!("{}_{}_{}", flight.airline, flight.flight_code, flight.departure_time),
        airline: flight.airline.clone(),
        airline_name: airline_name.to_owned(),
        airline_color: airline_color.to_owned(),
        code: flight.flight_code.clone(),
        time: flight.departure_time.clone(),
        price: flight.price,
        formatted_price: format!("₹{}", format_thousands(flight.price)),
        duration: flight.duration.clone(),
        stops: stops_text,
        stops_count: flight.stops,
        fare_class: fare_class.to_owned(),
        class_icon: class_icon.to_owned(),
        class_color: class_color.to_owned(),
        source: flight.source.clone(),
        confidence: flight.confidence_score,
        data_quality: flight.data_quality,
        is_direct: flight.stops == 0,
        is_cheapest: false,
        is_fastest: false,
        booking_url: format!(
            "upi://pay?pa=travel@agent&pn=Travel Agent&am={}&cu=INR&tn=Flight {}",
            flight.price, flight.flight_code
        ),
    }
}

/// Durations compare as plain strings, which is what the badge has always
/// meant: "10:05:00" sorts before "2:15:00". First minimum wins ties.
fn fastest_index(cards: &[FlightCard]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, card) in cards.iter().enumerate() {
        match best {
            Some(current) if cards[current].duration <= card.duration => {}
            _ => best = Some(index),
        }
    }
    best
}

fn fare_class_for(price: i64) -> (&'static str, &'static str, &'static str) {
    if price < 3000 {
        ("Economy", "🛫", "#4CAF50")
    } else if price < 6000 {
        ("Premium Economy", "✈️", "#2196F3")
    } else {
        ("Business", "🛩️", "#FF9800")
    }
}

fn airline_brand(airline: &str) -> (&'static str, &str) {
    match airline {
        "AI" => ("#FF6B35", "Air India"),
        "6E" => ("#FF1744", "IndiGo"),
        "QP" => ("#00BCD4", "Akasa Air"),
        "SG" => ("#9C27B0", "SpiceJet"),
        "G8" => ("#FF5722", "GoAir"),
        other => ("#607D8B", other),
    }
}

fn stops_text(stops: u32) -> String {
    match stops {
        0 => "Direct".to_owned(),
        1 => "1 stop".to_owned(),
        n => format!("{n} stops"),
    }
}

/// Groups digits in threes: 12500 renders as "12,500".
pub(super) fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::flight::{
        ConflictResolution, DataQuality, PriceAnalysis, PriceConsistency, PriceRange,
        ReconciledFlight,
    };

    use super::{build_cards, format_thousands};

    fn flight(airline: &str, code: &str, price: i64, duration: &str, stops: u32) -> ReconciledFlight {
        ReconciledFlight {
            airline: airline.to_owned(),
            flight_code: code.to_owned(),
            departure_time: "09:15".to_owned(),
            price,
            duration: duration.to_owned(),
            stops,
            source: "Amadeus".to_owned(),
            selected_source: "Amadeus".to_owned(),
            confidence_score: 0.9,
            data_quality: DataQuality::High,
            sources_used: vec!["Amadeus".to_owned()],
            resolution: ConflictResolution::SingleSource,
            price_analysis: PriceAnalysis {
                consistency: PriceConsistency::SingleSource,
                variance: 0,
                variance_percentage: 0.0,
                price_range: PriceRange { min: price, max: price },
                selected_price: price,
                price_count: 1,
            },
        }
    }

    #[test]
    fn cards_are_sorted_by_price_and_first_is_cheapest() {
        let cards = build_cards(&[
            flight("6E", "6E-101", 5200, "2:15:00", 0),
            flight("AI", "AI-202", 3100, "2:40:00", 1),
        ]);

        assert_eq!(cards[0].code, "AI-202");
        assert!(cards[0].is_cheapest);
        assert!(!cards[1].is_cheapest);
    }

    #[test]
    fn fastest_badge_uses_string_order_of_durations() {
        let cards = build_cards(&[
            flight("6E", "6E-101", 3000, "2:15:00", 0),
            flight("AI", "AI-202", 4000, "10:05:00", 1),
        ]);

        // "10:05:00" < "2:15:00" lexicographically, so the ten-hour flight
        // wears the fastest badge. Longstanding display behavior.
        let fastest: Vec<&str> =
            cards.iter().filter(|c| c.is_fastest).map(|c| c.code.as_str()).collect();
        assert_eq!(fastest, vec!["AI-202"]);
    }

    #[test]
    fn fare_class_buckets_follow_price() {
        let cards = build_cards(&[
            flight("6E", "A", 2999, "2:00:00", 0),
            flight("6E", "B", 3000, "2:00:00", 0),
            flight("6E", "C", 6000, "2:00:00", 0),
        ]);

        assert_eq!(cards[0].fare_class, "Economy");
        assert_eq!(cards[0].class_color, "#4CAF50");
        assert_eq!(cards[1].fare_class, "Premium Economy");
        assert_eq!(cards[1].class_icon, "✈️");
        assert_eq!(cards[2].fare_class, "Business");
        assert_eq!(cards[2].class_color, "#FF9800");
    }

    #[test]
    fn known_airlines_get_brand_colors_and_unknown_falls_back() {
        let cards = build_cards(&[
            flight("6E", "6E-101", 3000, "2:00:00", 0),
            flight("ZZ", "ZZ-900", 4000, "2:00:00", 2),
        ]);

        assert_eq!(cards[0].airline_name, "IndiGo");
        assert_eq!(cards[0].airline_color, "#FF1744");
        assert_eq!(cards[1].airline_name, "ZZ");
        assert_eq!(cards[1].airline_color, "#607D8B");
        assert_eq!(cards[1].stops, "2 stops");
        assert!(!cards[1].is_direct);
    }

    #[test]
    fn booking_url_embeds_price_and_code() {
        let cards = build_cards(&[flight("6E", "6E-101", 4500, "2:00:00", 0)]);
        assert_eq!(
            cards[0].booking_url,
            "upi://pay?pa=travel@agent&pn=Travel Agent&am=4500&cu=INR&tn=Flight 6E-101"
        );
        assert_eq!(cards[0].formatted_price, "₹4,500");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(format_thousands(950), "950");
        assert_eq!(format_thousands(4500), "4,500");
        assert_eq!(format_thousands(12500), "12,500");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }
}
