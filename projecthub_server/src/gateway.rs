//! The payment gateway client.
//!
//! The engine stores and verifies everything about an order; this module only covers the one outbound call the
//! server makes, asking the gateway to mint an order for a given amount. The trait seam exists so endpoint
//! tests can stand in a mock and exercise the whole flow without network access.

use log::*;
use ph_common::Paise;
use serde::Deserialize;
use serde_json::json;

use crate::{config::GatewayConfig, errors::ServerError};

/// A freshly minted order at the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrderResponse {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Asks the gateway to create an order for `amount`, returning the gateway's order id.
    async fn create_order(&self, amount: Paise, currency: &str, receipt: &str)
        -> Result<GatewayOrderResponse, ServerError>;
}

/// Razorpay's Orders API. Authenticates with HTTP basic auth using the account's key id and secret.
#[derive(Clone)]
pub struct RazorpayGateway {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl RazorpayGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { client: reqwest::Client::new(), config }
    }
}

impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount: Paise,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrderResponse, ServerError> {
        let url = format!("{}/v1/orders", self.config.base_url);
        let body = json!({
            "amount": amount.value(),
            "currency": currency,
            "receipt": receipt,
        });
        debug!("🛒️ Requesting gateway order of {amount} for receipt {receipt}");
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()))
            .json(&body)
            .send()
            .await
            .map_err(|e| ServerError::PaymentGatewayError(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            warn!("🛒️ Gateway returned {status} creating an order: {detail}");
            return Err(ServerError::PaymentGatewayError(format!("Gateway returned {status}")));
        }
        let order = response
            .json::<GatewayOrderResponse>()
            .await
            .map_err(|e| ServerError::PaymentGatewayError(format!("Could not parse gateway response. {e}")))?;
        debug!("🛒️ Gateway order {} created", order.id);
        Ok(order)
    }
}
