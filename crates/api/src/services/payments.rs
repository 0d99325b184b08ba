//! Payment ledger: recording settlements and reconciling provider events.
//!
//! Two paths lead to the same one-way `unpaid -> paid` transition:
//!
//! - [`PaymentLedger::record`] - a direct, synchronous payment record.
//!   Precondition violations (missing order, already paid) are errors.
//! - [`PaymentLedger::reconcile`] - an asynchronous provider webhook.
//!   The provider delivers at-least-once, so a missing or already-paid
//!   order is a logged no-op, never an error; redelivery is harmless
//!   because the `paid` compare-and-set admits exactly one winner.
//!
//! Webhook payloads are only trusted after their HMAC-SHA256 signature
//! over the raw body verifies against the configured shared secret.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, info, warn};

use orchard_core::{Money, OrderId};

use crate::db::payments::PaymentRepository;
use crate::models::payment::Payment;

type HmacSha256 = Hmac<Sha256>;

/// Event type emitted by the provider when a checkout session settles.
const EVENT_CHECKOUT_COMPLETED: &str = "checkout.completed";

/// Errors from the payment ledger.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The order does not exist.
    #[error("order not found")]
    OrderNotFound,

    /// The order is already paid; `paid` is terminal.
    #[error("order already paid")]
    AlreadyPaid,

    /// The webhook signature did not verify; nothing was mutated.
    #[error("invalid event signature")]
    InvalidSignature,

    /// The webhook body was not a valid event payload.
    #[error("malformed event payload: {0}")]
    MalformedEvent(#[from] serde_json::Error),

    /// Database failure; the transaction was rolled back.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A parsed, signature-verified notification from the payment provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEvent {
    /// Event type, e.g. `checkout.completed`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// The order the event refers to.
    pub order_id: OrderId,
    /// Settled amount.
    pub amount: Money,
    /// Provider identifier, when the provider reports one.
    #[serde(default)]
    pub provider: Option<String>,
}

/// Verify an HMAC-SHA256 signature (hex-encoded) over a raw payload.
///
/// Comparison happens inside the `Mac` verify API, which is constant-time.
/// Any malformed signature (bad hex, wrong length) is simply invalid.
#[must_use]
pub fn verify_signature(payload: &[u8], signature_hex: &str, secret: &SecretString) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(payload);

    mac.verify_slice(&expected).is_ok()
}

/// The payment ledger.
pub struct PaymentLedger<'a> {
    pool: &'a PgPool,
    /// Provider name recorded when the caller doesn't supply one.
    default_provider: &'a str,
}

impl<'a> PaymentLedger<'a> {
    /// Create a new payment ledger.
    #[must_use]
    pub const fn new(pool: &'a PgPool, default_provider: &'a str) -> Self {
        Self {
            pool,
            default_provider,
        }
    }

    /// Record a payment against an order and mark it paid.
    ///
    /// The `paid` flip and the payment insert commit in one transaction:
    /// the flag is never true without a completed payment row, nor the
    /// reverse.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::OrderNotFound`] if the order does not exist,
    /// [`PaymentError::AlreadyPaid`] if it is already settled (no new row
    /// is created), and [`PaymentError::Database`] on store failure.
    pub async fn record(
        &self,
        order_id: OrderId,
        amount: Money,
        provider: &str,
    ) -> Result<Payment, PaymentError> {
        let mut tx = self.pool.begin().await?;

        if !PaymentRepository::try_mark_paid(&mut tx, order_id).await? {
            // Zero rows updated: either the order is gone or already paid.
            return if PaymentRepository::order_exists(&mut tx, order_id).await? {
                Err(PaymentError::AlreadyPaid)
            } else {
                Err(PaymentError::OrderNotFound)
            };
        }

        let payment =
            PaymentRepository::insert_completed(&mut tx, order_id, amount, provider).await?;

        tx.commit().await?;

        info!(%order_id, %amount, provider, "payment recorded, order marked paid");

        Ok(payment)
    }

    /// Consume a raw provider webhook: verify, parse, reconcile.
    ///
    /// Returns the payment when this delivery won the paid transition, and
    /// `None` for every idempotent no-op (unknown event type, missing
    /// order, already-paid order).
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::InvalidSignature`] before anything else if
    /// the signature does not verify, [`PaymentError::MalformedEvent`] for
    /// an unparseable body, and [`PaymentError::Database`] on store failure.
    pub async fn reconcile(
        &self,
        payload: &[u8],
        signature_hex: &str,
        secret: &SecretString,
    ) -> Result<Option<Payment>, PaymentError> {
        if !verify_signature(payload, signature_hex, secret) {
            warn!("provider event rejected: signature verification failed");
            return Err(PaymentError::InvalidSignature);
        }

        let event: ProviderEvent = serde_json::from_slice(payload)?;
        self.apply_event(&event).await
    }

    /// Apply a verified provider event.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Database`] on store failure.
    pub async fn apply_event(
        &self,
        event: &ProviderEvent,
    ) -> Result<Option<Payment>, PaymentError> {
        if event.event_type != EVENT_CHECKOUT_COMPLETED {
            debug!(event_type = %event.event_type, "ignoring provider event");
            return Ok(None);
        }

        let provider = event.provider.as_deref().unwrap_or(self.default_provider);

        match self.record(event.order_id, event.amount, provider).await {
            Ok(payment) => Ok(Some(payment)),
            // At-least-once delivery: both of these mean the event has
            // nothing left to do, not that the request failed.
            Err(PaymentError::AlreadyPaid) => {
                debug!(order_id = %event.order_id, "event replayed for paid order, no-op");
                Ok(None)
            }
            Err(PaymentError::OrderNotFound) => {
                warn!(order_id = %event.order_id, "event for unknown order, no-op");
                Ok(None)
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &[u8], secret: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(secret.as_bytes()).expect("hmac accepts any key length");
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let secret = SecretString::from("whsec_0123456789abcdef");
        let payload = br#"{"type":"checkout.completed","order_id":1,"amount":"25.00"}"#;
        let signature = sign(payload, "whsec_0123456789abcdef");

        assert!(verify_signature(payload, &signature, &secret));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let secret = SecretString::from("whsec_0123456789abcdef");
        let payload = b"payload";
        let signature = sign(payload, "a-different-secret");

        assert!(!verify_signature(payload, &signature, &secret));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let secret = SecretString::from("whsec_0123456789abcdef");
        let signature = sign(b"original", "whsec_0123456789abcdef");

        assert!(!verify_signature(b"tampered", &signature, &secret));
    }

    #[test]
    fn test_malformed_hex_rejected() {
        let secret = SecretString::from("whsec_0123456789abcdef");
        assert!(!verify_signature(b"payload", "not-hex!", &secret));
        assert!(!verify_signature(b"payload", "", &secret));
        // Valid hex, wrong length.
        assert!(!verify_signature(b"payload", "deadbeef", &secret));
    }

    #[test]
    fn test_event_parses() {
        let payload = br#"{"type":"checkout.completed","order_id":42,"amount":"25.00","provider":"stripe"}"#;
        let event: ProviderEvent = serde_json::from_slice(payload).expect("valid event");
        assert_eq!(event.event_type, EVENT_CHECKOUT_COMPLETED);
        assert_eq!(event.order_id, OrderId::new(42));
        assert_eq!(event.amount, Money::from_units(25));
        assert_eq!(event.provider.as_deref(), Some("stripe"));
    }

    #[test]
    fn test_event_provider_optional() {
        let payload = br#"{"type":"checkout.completed","order_id":1,"amount":"9.99"}"#;
        let event: ProviderEvent = serde_json::from_slice(payload).expect("valid event");
        assert!(event.provider.is_none());
    }

    #[test]
    fn test_event_missing_order_id_is_malformed() {
        let payload = br#"{"type":"checkout.completed","amount":"9.99"}"#;
        assert!(serde_json::from_slice::<ProviderEvent>(payload).is_err());
    }

    #[test]
    fn test_event_negative_amount_is_malformed() {
        // A correctly signed event with a negative amount must die at the
        // parse boundary, before the ledger touches the store.
        let payload = br#"{"type":"checkout.completed","order_id":1,"amount":"-5.00"}"#;
        assert!(serde_json::from_slice::<ProviderEvent>(payload).is_err());
    }
}
