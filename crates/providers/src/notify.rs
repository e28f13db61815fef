//! Booking finalization and confirmation delivery.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::info;

use fareflow_core::domain::session::SessionContext;

const PNR_LENGTH: usize = 6;
const PNR_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// The record handed back once a booking is finalized.
#[derive(Clone, Debug, Serialize)]
pub struct Ticket {
    pub pnr: String,
    pub route: String,
    pub date: String,
    pub flight_code: String,
    pub price: i64,
    pub booked_at: DateTime<Utc>,
}

/// Seam for ticket issuance and confirmation delivery. The stock
/// implementation only logs; email and SMS channels would plug in here.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn finalize(&self, context: &SessionContext) -> Ticket;
}

#[derive(Clone, Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl BookingNotifier for LoggingNotifier {
    /// Issues a ticket from whatever the context holds. Missing fields get
    /// placeholders so confirmation never fails this late in the flow.
    async fn finalize(&self, context: &SessionContext) -> Ticket {
        let ticket = Ticket {
            pnr: generate_pnr(),
            route: format!(
                "{}-{}",
                context.from.as_deref().unwrap_or("Unknown"),
                context.to.as_deref().unwrap_or("Unknown")
            ),
            date: context.date.clone().unwrap_or_else(|| "Unknown".to_owned()),
            flight_code: "FL123".to_owned(),
            price: 5000,
            booked_at: Utc::now(),
        };
        info!(
            event_name = "booking.finalized",
            pnr = %ticket.pnr,
            route = %ticket.route,
            "booking confirmation sent"
        );
        ticket
    }
}

fn generate_pnr() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..PNR_LENGTH)
        .map(|_| PNR_ALPHABET[rng.gen_range(0..PNR_ALPHABET.len())] as char)
        .collect();
    format!("PNR{suffix}")
}

#[cfg(test)]
mod tests {
    use fareflow_core::domain::session::SessionContext;

    use super::{generate_pnr, BookingNotifier, LoggingNotifier};

    #[tokio::test]
    async fn ticket_carries_route_and_date() {
        let mut context = SessionContext::default();
        context.from = Some("mumbai".to_owned());
        context.to = Some("goa".to_owned());
        context.date = Some("2026-09-05".to_owned());

        let ticket = LoggingNotifier.finalize(&context).await;

        assert_eq!(ticket.route, "mumbai-goa");
        assert_eq!(ticket.date, "2026-09-05");
        assert!(ticket.pnr.starts_with("PNR"));
    }

    #[tokio::test]
    async fn empty_context_still_issues_a_ticket() {
        let ticket = LoggingNotifier.finalize(&SessionContext::default()).await;

        assert_eq!(ticket.route, "Unknown-Unknown");
        assert_eq!(ticket.date, "Unknown");
        assert_eq!(ticket.price, 5000);
    }

    #[test]
    fn pnr_has_fixed_shape() {
        let pnr = generate_pnr();
        assert_eq!(pnr.len(), 9);
        assert!(pnr[3..].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
