//! Donation routes. No session required.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::routes::request_origin;
use crate::services::donation::{self, CURRENCY, MIN_AMOUNT, SUGGESTED_AMOUNTS};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DonationBody {
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DonationOptions {
    pub enabled: bool,
    pub currency: String,
    pub min_amount: f64,
    pub suggested_amounts: Vec<u32>,
}

/// `GET /api/donations`: what the donation page offers.
pub async fn options(State(state): State<AppState>) -> Json<DonationOptions> {
    Json(DonationOptions {
        enabled: state.payments.is_some(),
        currency: CURRENCY.to_owned(),
        min_amount: MIN_AMOUNT,
        suggested_amounts: SUGGESTED_AMOUNTS.to_vec(),
    })
}

/// `POST /api/donations`: `{amount}` in euros to a checkout URL.
pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DonationBody>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let origin = request_origin(&headers, &state.config);
    let url = donation::create_donation(state.payments.as_deref(), body.amount, &origin).await?;
    Ok(Json(CheckoutResponse { url }))
}

#[cfg(test)]
#[path = "donations_test.rs"]
mod tests;
