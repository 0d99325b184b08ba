//! Payment route handlers: direct records, checkout sessions, webhooks.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use orchard_core::{Money, OrderId};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::services::payments::PaymentLedger;
use crate::state::AppState;

/// Header carrying the hex HMAC-SHA256 signature of the webhook body.
pub const SIGNATURE_HEADER: &str = "x-payment-signature";

/// Build the payment router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments/pay", post(pay))
        .route("/payments/checkout-session", post(checkout_session))
        .route("/payments/webhook", post(webhook))
}

#[derive(Debug, Deserialize)]
pub struct PayRequest {
    pub order_id: OrderId,
    pub amount: Money,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSessionRequest {
    pub order_id: OrderId,
}

#[derive(Debug, Serialize)]
struct CheckoutSessionResponse {
    url: String,
}

/// POST /payments/pay - Record a payment and mark the order paid.
#[instrument(skip(state))]
async fn pay(
    State(state): State<AppState>,
    Json(req): Json<PayRequest>,
) -> Result<impl IntoResponse> {
    let provider = req
        .provider
        .as_deref()
        .unwrap_or(&state.config().provider.name);

    let payment = PaymentLedger::new(state.pool(), &state.config().provider.name)
        .record(req.order_id, req.amount, provider)
        .await?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// POST /payments/checkout-session - Open a provider checkout session.
///
/// Returns the provider's redirect URL for the buyer to complete payment;
/// settlement arrives later through the webhook.
#[instrument(skip(state))]
async fn checkout_session(
    State(state): State<AppState>,
    Json(req): Json<CheckoutSessionRequest>,
) -> Result<impl IntoResponse> {
    let order = OrderRepository::new(state.pool())
        .get(req.order_id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_owned()))?;

    if order.paid {
        return Err(AppError::AlreadyPaid);
    }

    let url = state.provider().create_checkout_session(&order).await?;

    Ok(Json(CheckoutSessionResponse {
        url: url.to_string(),
    }))
}

/// POST /payments/webhook - Consume an asynchronous provider event.
///
/// The raw body is verified against the shared secret before parsing.
/// Replayed or out-of-order deliveries acknowledge with 200 and change
/// nothing; only an invalid signature or malformed body is an error.
#[instrument(skip(state, headers, body))]
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::InvalidSignature)?;

    let config = state.config();
    let ledger = PaymentLedger::new(state.pool(), &config.provider.name);

    let payment = ledger
        .reconcile(&body, signature, &config.provider.webhook_secret)
        .await?;

    Ok(Json(json!({
        "received": true,
        "settled": payment.is_some(),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pay_request_parses() {
        let req: PayRequest =
            serde_json::from_str(r#"{"order_id":1,"amount":"25.00"}"#).expect("valid request");
        assert_eq!(req.order_id, OrderId::new(1));
        assert_eq!(req.amount, Money::from_units(25));
        assert!(req.provider.is_none());
    }

    #[test]
    fn test_pay_request_negative_amount_rejected_at_parse() {
        let result = serde_json::from_str::<PayRequest>(r#"{"order_id":1,"amount":"-5.00"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_pay_request_with_provider() {
        let req: PayRequest =
            serde_json::from_str(r#"{"order_id":1,"amount":"9.99","provider":"stripe"}"#)
                .expect("valid request");
        assert_eq!(req.provider.as_deref(), Some("stripe"));
    }
}
