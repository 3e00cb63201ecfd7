//! Hosted checkout.
//!
//! Card capture happens on the provider's page; this module only opens a session and
//! hands its id and redirect URL back to the browser.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::domain::aggregates::Cart;
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    pub name: String,
    pub image_url: Option<String>,
    /// Minor units (cents).
    pub unit_amount: i64,
    pub quantity: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    pub currency: String,
    pub lines: Vec<CheckoutLine>,
}

impl CheckoutRequest {
    /// One line per cart item at its discounted unit price, plus a tax line.
    pub fn from_cart(cart: &Cart) -> Result<Self> {
        let mut lines: Vec<CheckoutLine> = cart.items().iter().map(|item| CheckoutLine {
            name: item.name.clone(),
            image_url: item.image_url.clone().filter(|u| !u.is_empty()),
            unit_amount: cart.discounted_unit_price(item).minor_units(),
            quantity: item.quantity,
        }).collect();

        let tax = cart.tax().minor_units();
        if tax > 0 {
            lines.push(CheckoutLine { name: "Sales tax".to_string(), image_url: None, unit_amount: tax, quantity: 1 });
        }

        let request = Self { currency: cart.currency().to_string(), lines };
        if request.total() <= 0 {
            return Err(StorefrontError::EmptyCheckout);
        }
        Ok(request)
    }

    pub fn total(&self) -> i64 {
        self.lines.iter().map(|l| l.unit_amount * i64::from(l.quantity)).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[async_trait]
pub trait CheckoutGateway: Send + Sync {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession>;
}

/// Stripe Checkout over its form-encoded REST API.
pub struct StripeCheckout {
    client: reqwest::Client,
    secret_key: Option<String>,
    api_base: String,
    success_url: String,
    cancel_url: String,
}

#[derive(Deserialize)]
struct StripeErrorBody { error: StripeError }

#[derive(Deserialize)]
struct StripeError { message: Option<String> }

impl StripeCheckout {
    pub fn new(config: &Config) -> Self {
        if config.stripe_secret_key.is_none() {
            tracing::warn!("STRIPE_SECRET_KEY not set; checkout sessions will fail");
        }
        Self {
            client: reqwest::Client::new(),
            secret_key: config.stripe_secret_key.clone(),
            api_base: config.stripe_api_base.clone(),
            success_url: format!("{}/success", config.client_url),
            cancel_url: format!("{}/cancel", config.client_url),
        }
    }

    /// Stripe's bracketed form encoding of a session request.
    pub fn form(&self, request: &CheckoutRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("payment_method_types[]".to_string(), "card".to_string()),
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];
        for (i, line) in request.lines.iter().enumerate() {
            let key = |k: &str| format!("line_items[{i}]{k}");
            form.push((key("[price_data][currency]"), request.currency.clone()));
            form.push((key("[price_data][product_data][name]"), line.name.clone()));
            if let Some(image) = &line.image_url {
                form.push((key("[price_data][product_data][images][]"), image.clone()));
            }
            form.push((key("[price_data][unit_amount]"), line.unit_amount.to_string()));
            form.push((key("[quantity]"), line.quantity.to_string()));
        }
        form
    }
}

#[async_trait]
impl CheckoutGateway for StripeCheckout {
    async fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let key = self.secret_key.as_deref()
            .ok_or_else(|| StorefrontError::PaymentGateway("STRIPE_SECRET_KEY is not configured".to_string()))?;

        let response = self.client
            .post(format!("{}/checkout/sessions", self.api_base))
            .bearer_auth(key)
            .header("Idempotency-Key", uuid::Uuid::new_v4().to_string())
            .form(&self.form(request))
            .send()
            .await
            .map_err(|e| StorefrontError::PaymentGateway(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.json::<StripeErrorBody>().await.ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("checkout session request failed with {}", status));
            return Err(StorefrontError::PaymentGateway(message));
        }

        let session: CheckoutSession = response.json().await.map_err(|e| StorefrontError::PaymentGateway(e.to_string()))?;
        tracing::info!(session_id = %session.id, total = request.total(), currency = %request.currency, "checkout session created");
        Ok(session)
    }
}
