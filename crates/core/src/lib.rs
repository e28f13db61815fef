pub mod config;
pub mod domain;
pub mod errors;
pub mod policy;
pub mod ranking;
pub mod reconcile;
pub mod response;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::flight::{
    ConflictResolution, DataQuality, PriceAnalysis, PriceConsistency, PriceRange, RawOffer,
    ReconciledFlight,
};
pub use domain::session::{BookingStage, SessionContext, SlotUpdate, REQUIRED_SLOTS, WEEK_SEARCH};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use policy::{decide_next_action, NextAction};
pub use ranking::Ranker;
pub use reconcile::{Reconciler, ReconciliationReport, SourceReliability};
pub use response::{FlightCard, ResponseAssembler, StateSummary, ERROR_ACTIONS, ERROR_REPLY};
