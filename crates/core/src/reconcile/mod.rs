//! Multi-Source Flight Reconciliation
//!
//! Collapses overlapping offers from several flight data sources into a
//! single deduplicated list, resolving conflicts by source reliability and
//! attaching a confidence score and quality grade to every surviving flight.

mod engine;
mod scoring;
mod types;

pub use engine::Reconciler;
pub use types::*;

/// Offers whose prices differ by more than this fraction are different flights
pub const PRICE_TOLERANCE: f64 = 0.15;

/// Offers departing further apart than this are different flights
pub const TIME_TOLERANCE_MINUTES: i64 = 30;

/// Reliability assumed for a source missing from the configured table
pub const DEFAULT_RELIABILITY: f64 = 0.5;

/// Departure-time spread (hours) at which time agreement bottoms out
pub const TIME_AGREEMENT_WINDOW_HOURS: f64 = 2.0;

/// Weight of the winning source's reliability in the confidence blend
pub const RELIABILITY_WEIGHT: f64 = 0.7;

/// Weight of cross-source agreement in the confidence blend
pub const AGREEMENT_WEIGHT: f64 = 0.3;

/// Reconciled flights kept after the confidence sort
pub const MAX_RECONCILED_FLIGHTS: usize = 3;
