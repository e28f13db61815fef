//! Confidence and price-consistency scoring for reconciled groups

use crate::domain::flight::{PriceAnalysis, PriceConsistency, PriceRange};

use super::types::TaggedOffer;
use super::{AGREEMENT_WEIGHT, RELIABILITY_WEIGHT, TIME_AGREEMENT_WINDOW_HOURS};

/// Blends the strongest source's reliability with how well the group's
/// prices and departure times agree. Single-offer groups score exactly their
/// source's reliability.
pub(crate) fn confidence_score(group: &[TaggedOffer]) -> f64 {
    let base = group.iter().map(|t| t.reliability).fold(0.0, f64::max);
    if group.len() <= 1 {
        return base.clamp(0.0, 1.0);
    }

    let prices: Vec<i64> =
        group.iter().map(|t| t.offer.price).filter(|price| *price > 0).collect();
    let minutes: Vec<u32> = group.iter().filter_map(|t| t.offer.departure_minutes()).collect();

    let agreement = (price_agreement(&prices) + time_agreement(&minutes)) / 2.0;
    (base * RELIABILITY_WEIGHT + agreement * AGREEMENT_WEIGHT).clamp(0.0, 1.0)
}

/// 1.0 when all positive prices match, falling linearly as the spread grows
/// toward the full price. No positive prices at all scores a neutral 0.5.
pub(crate) fn price_agreement(prices: &[i64]) -> f64 {
    let Some(max) = prices.iter().copied().max() else {
        return 0.5;
    };
    let min = prices.iter().copied().min().unwrap_or(max);
    if max == 0 {
        return 0.5;
    }
    let spread = (max - min) as f64 / max as f64;
    (1.0 - spread).max(0.0)
}

/// 1.0 when all parsable departure times match, reaching zero once they span
/// the full agreement window. No parsable times scores a neutral 0.5.
pub(crate) fn time_agreement(minutes: &[u32]) -> f64 {
    let (Some(max), Some(min)) = (minutes.iter().max(), minutes.iter().min()) else {
        return 0.5;
    };
    let hours_range = f64::from(max - min) / 60.0;
    (1.0 - hours_range / TIME_AGREEMENT_WINDOW_HOURS).max(0.0)
}

/// Describes how well a group's prices line up around the selected one.
pub(crate) fn analyze_prices(prices: &[i64], selected_price: i64) -> PriceAnalysis {
    if prices.len() < 2 {
        return PriceAnalysis {
            consistency: PriceConsistency::SingleSource,
            variance: 0,
            variance_percentage: 0.0,
            price_range: PriceRange { min: selected_price, max: selected_price },
            selected_price,
            price_count: prices.len(),
        };
    }

    let min = prices.iter().copied().min().unwrap_or(selected_price);
    let max = prices.iter().copied().max().unwrap_or(selected_price);
    let variance = max - min;
    let variance_percentage = if max > 0 {
        (variance as f64 / max as f64 * 1000.0).round() / 10.0
    } else {
        0.0
    };

    let consistency = if variance_percentage <= 5.0 {
        PriceConsistency::High
    } else if variance_percentage <= 15.0 {
        PriceConsistency::Medium
    } else {
        PriceConsistency::Low
    };

    PriceAnalysis {
        consistency,
        variance,
        variance_percentage,
        price_range: PriceRange { min, max },
        selected_price,
        price_count: prices.len(),
    }
}
