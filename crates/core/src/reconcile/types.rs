//! Shared types for reconciliation

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::flight::RawOffer;

/// Trust weights per source name, each in `[0.0, 1.0]`. Unknown sources get
/// [`DEFAULT_RELIABILITY`](super::DEFAULT_RELIABILITY).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceReliability {
    weights: BTreeMap<String, f64>,
}

impl SourceReliability {
    pub fn new(weights: BTreeMap<String, f64>) -> Self {
        Self { weights }
    }

    pub fn weight(&self, source: &str) -> f64 {
        self.weights.get(source).copied().unwrap_or(super::DEFAULT_RELIABILITY)
    }
}

impl Default for SourceReliability {
    fn default() -> Self {
        let weights = BTreeMap::from([
            ("Amadeus".to_owned(), 0.9),
            ("Skyscanner".to_owned(), 0.8),
            ("Cleartrip".to_owned(), 0.7),
            ("MakeMyTrip".to_owned(), 0.7),
            ("Mock".to_owned(), 0.1),
        ]);
        Self { weights }
    }
}

/// An offer annotated with its source's trust weight.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TaggedOffer {
    pub offer: RawOffer,
    pub reliability: f64,
}

/// Summary of a reconciliation pass, for logging and diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub total_sources: usize,
    pub total_offers: usize,
    pub conflicts_detected: usize,
    pub reconciliation_needed: bool,
    pub price_tolerance: f64,
    pub time_tolerance_minutes: i64,
}

#[cfg(test)]
mod tests {
    use super::SourceReliability;

    #[test]
    fn known_sources_use_configured_weights() {
        let reliability = SourceReliability::default();
        assert_eq!(reliability.weight("Amadeus"), 0.9);
        assert_eq!(reliability.weight("Mock"), 0.1);
    }

    #[test]
    fn unknown_sources_fall_back_to_default_weight() {
        let reliability = SourceReliability::default();
        assert_eq!(reliability.weight("Kayak"), super::super::DEFAULT_RELIABILITY);
    }
}
