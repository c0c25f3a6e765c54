use std::sync::Arc;

use axum::extract::State;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResult, ok};

#[derive(Serialize, ToSchema)]
pub struct PriceResponse {
    /// USD per ETH
    #[schema(value_type = String, example = "3500")]
    pub price: Decimal,
    /// `null` while the configured default is still in effect
    pub last_update: Option<DateTime<Utc>>,
    pub source: Option<String>,
}

/// Published ETH/USD price
///
/// Also served at `/eth-price`.
#[utoipa::path(
    get,
    path = "/price",
    responses(
        (status = 200, description = "Last accepted quote", body = PriceResponse, content_type = "application/json")
    ),
    tag = "Price"
)]
pub async fn get_price(State(state): State<Arc<AppState>>) -> ApiResult<PriceResponse> {
    let snap = state.price.snapshot().await;
    ok(PriceResponse {
        price: snap.price,
        last_update: snap.last_update,
        source: snap.source,
    })
}
