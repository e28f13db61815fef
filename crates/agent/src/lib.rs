//! Slot Extraction - deterministic parsing of chat messages
//!
//! This crate turns free-form user text into a structured `SlotUpdate`:
//! - Intent (search, book, confirm) from keyword patterns
//! - Origin and destination cities via a canonical alias directory
//! - Travel dates, including relative phrases and the week-search sentinel
//! - Fare preferences (cheapest, earliest, business)
//!
//! # Design Principle
//!
//! Extraction is a pure translation step. It never decides what happens
//! next; the decision policy in the core crate owns that. A message the
//! extractor cannot read produces an empty update, not a guess.

pub mod cities;
pub mod extraction;

pub use cities::CityDirectory;
pub use extraction::SlotExtractor;
