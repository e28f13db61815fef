//! Upstream integrations - flight inventories, payments, notifications
//!
//! Everything that talks to the outside world lives here, behind traits
//! the server wires up at bootstrap:
//! - `FlightSource` for inventory (Amadeus in live mode, canned fixtures
//!   in demo mode), fanned out concurrently by `SourceFanout`
//! - `PaymentLinkProvider` for UPI deep links
//! - `BookingNotifier` for ticket issuance and confirmation delivery
//!
//! # Design Principle
//!
//! A failing upstream degrades, never crashes. Sources that error or time
//! out contribute nothing to a search; payment and notification fall back
//! to placeholder fields rather than refusing to proceed.

pub mod amadeus;
pub mod fanout;
pub mod flights;
pub mod notify;
pub mod payment;

pub use amadeus::AmadeusSource;
pub use fanout::SourceFanout;
pub use flights::{FlightSource, SearchQuery, SourceError, StaticSource};
pub use notify::{BookingNotifier, LoggingNotifier, Ticket};
pub use payment::{PaymentLink, PaymentLinkProvider, PaymentStatus, UpiPaymentLinks};
