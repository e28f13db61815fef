use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// A flight offer exactly as one upstream source reported it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawOffer {
    pub airline: String,
    pub flight_code: String,
    /// Departure time as "HH:MM". Kept as text because sources disagree on
    /// formats; parsing happens lazily via [`departure_minutes`](Self::departure_minutes).
    pub departure_time: String,
    /// Price in whole rupees.
    pub price: i64,
    pub duration: String,
    pub stops: u32,
    pub source: String,
}

impl RawOffer {
    /// Minutes past midnight, or `None` when the time string is unparsable.
    pub fn departure_minutes(&self) -> Option<u32> {
        let time = NaiveTime::parse_from_str(self.departure_time.trim(), "%H:%M").ok()?;
        Some(time.hour() * 60 + time.minute())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    High,
    Medium,
    Low,
    Unknown,
}

impl DataQuality {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            Self::High
        } else if confidence >= 0.6 {
            Self::Medium
        } else if confidence >= 0.3 {
            Self::Low
        } else {
            Self::Unknown
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceConsistency {
    SingleSource,
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAnalysis {
    pub consistency: PriceConsistency,
    pub variance: i64,
    pub variance_percentage: f64,
    pub price_range: PriceRange,
    pub selected_price: i64,
    pub price_count: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    SingleSource,
    MostReliableSource,
}

/// One flight after cross-source reconciliation, carrying the provenance and
/// confidence metadata downstream ranking and rendering rely on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciledFlight {
    pub airline: String,
    pub flight_code: String,
    pub departure_time: String,
    pub price: i64,
    pub duration: String,
    pub stops: u32,
    /// "Amadeus" for a lone source, "Reconciled(2 sources)" for a merge.
    pub source: String,
    pub selected_source: String,
    pub confidence_score: f64,
    pub data_quality: DataQuality,
    pub sources_used: Vec<String>,
    pub resolution: ConflictResolution,
    pub price_analysis: PriceAnalysis,
}
