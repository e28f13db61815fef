//! Grouping and conflict resolution across sources

use std::collections::BTreeMap;

use crate::domain::flight::{
    ConflictResolution, DataQuality, RawOffer, ReconciledFlight,
};

use super::scoring;
use super::types::{ReconciliationReport, SourceReliability, TaggedOffer};
use super::{MAX_RECONCILED_FLIGHTS, PRICE_TOLERANCE, TIME_TOLERANCE_MINUTES};

#[derive(Clone, Debug, Default)]
pub struct Reconciler {
    reliability: SourceReliability,
}

impl Reconciler {
    pub fn new(reliability: SourceReliability) -> Self {
        Self { reliability }
    }

    /// Collapses per-source offer lists into at most
    /// [`MAX_RECONCILED_FLIGHTS`] flights, ordered by confidence.
    pub fn reconcile(
        &self,
        offers_by_source: &BTreeMap<String, Vec<RawOffer>>,
    ) -> Vec<ReconciledFlight> {
        let tagged = self.flatten(offers_by_source);
        let groups = group_similar(tagged);

        let mut flights: Vec<ReconciledFlight> =
            groups.iter().map(|group| resolve_group(group)).collect();
        flights.sort_by(|a, b| {
            b.confidence_score
                .partial_cmp(&a.confidence_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        flights.truncate(MAX_RECONCILED_FLIGHTS);
        flights
    }

    /// Summarizes what a reconciliation pass over these offers would do,
    /// without resolving anything. Conflicts are counted per offer and per
    /// foreign source: two sources agreeing on one flight report two
    /// conflicts, one from each side.
    pub fn report(&self, offers_by_source: &BTreeMap<String, Vec<RawOffer>>) -> ReconciliationReport {
        let total_offers = offers_by_source.values().map(Vec::len).sum();

        let mut conflicts_detected = 0;
        for (source, offers) in offers_by_source {
            for offer in offers {
                for (other_source, other_offers) in offers_by_source {
                    if source != other_source
                        && other_offers.iter().any(|other| are_similar(offer, other))
                    {
                        conflicts_detected += 1;
                    }
                }
            }
        }

        ReconciliationReport {
            total_sources: offers_by_source.len(),
            total_offers,
            conflicts_detected,
            reconciliation_needed: conflicts_detected > 0,
            price_tolerance: PRICE_TOLERANCE,
            time_tolerance_minutes: TIME_TOLERANCE_MINUTES,
        }
    }

    fn flatten(&self, offers_by_source: &BTreeMap<String, Vec<RawOffer>>) -> Vec<TaggedOffer> {
        offers_by_source
            .iter()
            .flat_map(|(source, offers)| {
                let reliability = self.reliability.weight(source);
                offers
                    .iter()
                    .map(move |offer| TaggedOffer { offer: offer.clone(), reliability })
            })
            .collect()
    }
}

/// Two offers describe the same flight when the airline matches exactly, the
/// departure times are within tolerance (or either is unparsable), and the
/// prices are within tolerance (or either is non-positive).
fn are_similar(a: &RawOffer, b: &RawOffer) -> bool {
    if a.airline != b.airline {
        return false;
    }

    let times_close = match (a.departure_minutes(), b.departure_minutes()) {
        (Some(ma), Some(mb)) => (i64::from(ma) - i64::from(mb)).abs() <= TIME_TOLERANCE_MINUTES,
        // A time we cannot read is never grounds for splitting a group.
        _ => true,
    };
    if !times_close {
        return false;
    }

    if a.price <= 0 || b.price <= 0 {
        return true;
    }
    let max = a.price.max(b.price);
    let diff = (a.price - b.price).abs();
    (diff as f64 / max as f64) <= PRICE_TOLERANCE
}

/// First-match grouping: each offer joins the first existing group whose
/// first member it resembles. Groups are never re-evaluated transitively.
fn group_similar(offers: Vec<TaggedOffer>) -> Vec<Vec<TaggedOffer>> {
    let mut groups: Vec<Vec<TaggedOffer>> = Vec::new();
    for tagged in offers {
        let position = groups
            .iter()
            .position(|group| are_similar(&group[0].offer, &tagged.offer));
        match position {
            Some(index) => groups[index].push(tagged),
            None => groups.push(vec![tagged]),
        }
    }
    groups
}

/// First strict maximum, so earlier sources win reliability ties.
fn most_reliable(group: &[TaggedOffer]) -> &TaggedOffer {
    let mut winner = &group[0];
    for candidate in &group[1..] {
        if candidate.reliability > winner.reliability {
            winner = candidate;
        }
    }
    winner
}

fn resolve_group(group: &[TaggedOffer]) -> ReconciledFlight {
    let confidence_score = scoring::confidence_score(group);
    let data_quality = DataQuality::from_confidence(confidence_score);
    let winner = most_reliable(group);
    let offer = &winner.offer;

    let (source, resolution) = if group.len() == 1 {
        (offer.source.clone(), ConflictResolution::SingleSource)
    } else {
        (
            format!("Reconciled({} sources)", group.len()),
            ConflictResolution::MostReliableSource,
        )
    };

    let prices: Vec<i64> =
        group.iter().map(|t| t.offer.price).filter(|price| *price > 0).collect();

    ReconciledFlight {
        airline: offer.airline.clone(),
        flight_code: offer.flight_code.clone(),
        departure_time: offer.departure_time.clone(),
        price: offer.price,
        duration: offer.duration.clone(),
        stops: offer.stops,
        source,
        selected_source: offer.source.clone(),
        confidence_score,
        data_quality,
        sources_used: group.iter().map(|t| t.offer.source.clone()).collect(),
        resolution,
        price_analysis: scoring::analyze_prices(&prices, offer.price),
    }
}
