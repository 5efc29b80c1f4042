//! Donations through a hosted payment checkout.
//!
//! The only server-side business function the board has: validate an
//! amount in euros, open a one-off checkout session with the payment
//! provider, and hand its URL back. Provider failures are reported to the
//! caller as a generic remote error; details stay in the logs.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;

const STRIPE_API_URL: &str = "https://api.stripe.com/v1/checkout/sessions";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

pub const CURRENCY: &str = "eur";
pub const SUGGESTED_AMOUNTS: [u32; 4] = [5, 10, 25, 50];
pub const MIN_AMOUNT: f64 = 1.0;
const MAX_AMOUNT: f64 = 100_000.0;
const PRODUCT_NAME: &str = "Support Computerslet 3000";
const PRODUCT_DESCRIPTION: &str = "Voluntary donation towards the development of Computerslet 3000";

#[derive(Debug, thiserror::Error)]
pub enum DonationError {
    #[error("a valid amount of at least 1 is required")]
    InvalidAmount,
    #[error("donations are not configured")]
    Disabled,
    #[error("http client build failed: {0}")]
    HttpClientBuild(String),
    #[error("payment request failed: {0}")]
    Request(String),
    #[error("payment provider returned {status}: {body}")]
    Response { status: u16, body: String },
}

impl From<DonationError> for AppError {
    fn from(err: DonationError) -> Self {
        match err {
            DonationError::InvalidAmount => Self::Validation(err.to_string()),
            other => {
                tracing::error!(error = %other, "donation checkout failed");
                Self::Remote("payment provider unavailable".into())
            }
        }
    }
}

/// What the provider needs to open a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub unit_amount_cents: i64,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutRequest {
    /// Build a checkout for `amount` euros returning to `origin`.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` when `amount` is missing, not finite, below one or
    /// absurdly large.
    pub fn for_amount(amount: Option<f64>, origin: &str) -> Result<Self, DonationError> {
        let amount = amount
            .filter(|a| a.is_finite() && (MIN_AMOUNT..=MAX_AMOUNT).contains(a))
            .ok_or(DonationError::InvalidAmount)?;
        // Bounded above, so the cent value fits comfortably.
        #[allow(clippy::cast_possible_truncation)]
        let unit_amount_cents = (amount * 100.0).round() as i64;
        let origin = origin.trim_end_matches('/');
        Ok(Self {
            unit_amount_cents,
            success_url: format!("{origin}/donatie-bedankt"),
            cancel_url: format!("{origin}/donatie"),
        })
    }

    fn form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "payment".into()),
            ("line_items[0][quantity]", "1".into()),
            ("line_items[0][price_data][currency]", CURRENCY.into()),
            ("line_items[0][price_data][unit_amount]", self.unit_amount_cents.to_string()),
            ("line_items[0][price_data][product_data][name]", PRODUCT_NAME.into()),
            ("line_items[0][price_data][product_data][description]", PRODUCT_DESCRIPTION.into()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
        ]
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted checkout and return its URL.
    ///
    /// # Errors
    ///
    /// Returns a [`DonationError`] if the provider is unreachable or refuses.
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<String, DonationError>;
}

// =============================================================================
// STRIPE
// =============================================================================

pub struct StripeGateway {
    http: reqwest::Client,
    secret_key: String,
    api_url: String,
}

impl StripeGateway {
    /// # Errors
    ///
    /// Returns `HttpClientBuild` if the HTTP client cannot be built.
    pub fn new(secret_key: String) -> Result<Self, DonationError> {
        Self::with_api_url(secret_key, STRIPE_API_URL.into())
    }

    /// # Errors
    ///
    /// Returns `HttpClientBuild` if the HTTP client cannot be built.
    pub fn with_api_url(secret_key: String, api_url: String) -> Result<Self, DonationError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| DonationError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, secret_key, api_url })
    }
}

#[derive(Deserialize)]
struct CheckoutSession {
    url: Option<String>,
}

fn parse_checkout_response(text: &str) -> Result<String, DonationError> {
    let session: CheckoutSession =
        serde_json::from_str(text).map_err(|e| DonationError::Request(format!("unexpected response: {e}")))?;
    session
        .url
        .ok_or_else(|| DonationError::Request("checkout session has no url".into()))
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<String, DonationError> {
        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.secret_key)
            .form(&request.form())
            .send()
            .await
            .map_err(|e| DonationError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| DonationError::Request(e.to_string()))?;

        if status != 200 {
            return Err(DonationError::Response { status, body: text });
        }
        parse_checkout_response(&text)
    }
}

/// Validate `amount` and open a checkout on `gateway`.
pub async fn create_donation(
    gateway: Option<&dyn PaymentGateway>,
    amount: Option<f64>,
    origin: &str,
) -> Result<String, AppError> {
    let request = CheckoutRequest::for_amount(amount, origin)?;
    let gateway = gateway.ok_or(DonationError::Disabled)?;
    let url = gateway.create_checkout(&request).await?;
    tracing::info!(cents = request.unit_amount_cents, "donation checkout created");
    Ok(url)
}

#[cfg(test)]
#[path = "donation_test.rs"]
mod tests;
