//! Payment link generation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use fareflow_core::domain::session::SessionContext;

const PAYEE_ADDRESS: &str = "travel@agent";
const PAYEE_NAME: &str = "Travel Agent";
const DEFAULT_AMOUNT: i64 = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

/// A UPI deep link a user can tap to pay for the booking under review.
#[derive(Clone, Debug, Serialize)]
pub struct PaymentLink {
    pub payment_id: String,
    pub upi_link: String,
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: PaymentStatus,
}

/// Seam for the payment backend. The stock implementation mints UPI links
/// locally; a gateway integration would live behind the same trait.
#[async_trait]
pub trait PaymentLinkProvider: Send + Sync {
    async fn generate(&self, context: &SessionContext) -> PaymentLink;
}

#[derive(Clone, Debug, Default)]
pub struct UpiPaymentLinks;

#[async_trait]
impl PaymentLinkProvider for UpiPaymentLinks {
    /// Missing context fields fall back to placeholders so a link always
    /// comes back; the conversation never dead-ends at payment.
    async fn generate(&self, context: &SessionContext) -> PaymentLink {
        let from_city = context.from.as_deref().unwrap_or("Unknown");
        let to_city = context.to.as_deref().unwrap_or("Unknown");
        let date = context.date.as_deref().unwrap_or("Unknown");
        let amount = DEFAULT_AMOUNT;

        let payment_id = short_id();
        let upi_link = format!(
            "upi://pay?pa={PAYEE_ADDRESS}&pn={PAYEE_NAME}&am={amount}&cu=INR&tn=Flight {from_city}-{to_city}"
        );
        info!(event_name = "payment.link_generated", payment_id = %payment_id);

        PaymentLink {
            payment_id,
            upi_link,
            amount,
            currency: "INR".to_owned(),
            description: format!("Flight from {from_city} to {to_city} on {date}"),
            created_at: Utc::now(),
            status: PaymentStatus::Pending,
        }
    }
}

/// First eight hex characters of a v4 uuid.
fn short_id() -> String {
    Uuid::new_v4().to_string()[..8].to_owned()
}

#[cfg(test)]
mod tests {
    use fareflow_core::domain::session::SessionContext;

    use super::{short_id, PaymentLinkProvider, PaymentStatus, UpiPaymentLinks};

    fn ready_context() -> SessionContext {
        let mut context = SessionContext::default();
        context.from = Some("mumbai".to_owned());
        context.to = Some("delhi".to_owned());
        context.date = Some("2026-09-05".to_owned());
        context
    }

    #[tokio::test]
    async fn link_embeds_route_and_amount() {
        let link = UpiPaymentLinks.generate(&ready_context()).await;

        assert_eq!(
            link.upi_link,
            "upi://pay?pa=travel@agent&pn=Travel Agent&am=5000&cu=INR&tn=Flight mumbai-delhi"
        );
        assert_eq!(link.description, "Flight from mumbai to delhi on 2026-09-05");
        assert_eq!(link.currency, "INR");
        assert_eq!(link.status, PaymentStatus::Pending);
        assert_eq!(link.payment_id.len(), 8);
    }

    #[tokio::test]
    async fn missing_context_falls_back_to_placeholders() {
        let link = UpiPaymentLinks.generate(&SessionContext::default()).await;

        assert!(link.upi_link.contains("tn=Flight Unknown-Unknown"));
        assert_eq!(link.amount, 5000);
    }

    #[test]
    fn short_ids_are_eight_characters() {
        assert_eq!(short_id().len(), 8);
        assert_ne!(short_id(), short_id());
    }
}
