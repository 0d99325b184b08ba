//! Outbound payment provider client.
//!
//! The provider is a black box reached over HTTP: we open a checkout
//! session for an order and hand the buyer the redirect URL. Settlement
//! comes back asynchronously through the webhook handled by the ledger.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::ProviderConfig;
use crate::models::order::Order;

/// Errors talking to the payment provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No provider API URL is configured.
    #[error("payment provider is not configured")]
    NotConfigured,

    /// The provider request failed or returned an error status.
    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned an unusable redirect URL.
    #[error("provider returned invalid redirect url: {0}")]
    InvalidRedirectUrl(#[from] url::ParseError),
}

#[derive(Debug, Serialize)]
struct CheckoutSessionRequest<'a> {
    order_id: i32,
    amount: &'a str,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    url: String,
}

/// HTTP client for the payment provider API.
#[derive(Clone)]
pub struct ProviderClient {
    http: Client,
    api_url: Option<String>,
}

impl ProviderClient {
    /// Create a new provider client from configuration.
    #[must_use]
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            http: Client::new(),
            api_url: config.api_url.clone(),
        }
    }

    /// Open a checkout session for an order and return the redirect URL.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotConfigured`] when no provider URL is set,
    /// [`ProviderError::Request`] on transport or HTTP-status failure, and
    /// [`ProviderError::InvalidRedirectUrl`] if the response URL is garbage.
    pub async fn create_checkout_session(&self, order: &Order) -> Result<Url, ProviderError> {
        let api_url = self.api_url.as_deref().ok_or(ProviderError::NotConfigured)?;

        let amount = order.total_amount.to_string();
        let request = CheckoutSessionRequest {
            order_id: order.id.as_i32(),
            amount: &amount,
        };

        let response = self
            .http
            .post(format!("{api_url}/checkout/sessions"))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<CheckoutSessionResponse>()
            .await?;

        Ok(Url::parse(&response.url)?)
    }
}
