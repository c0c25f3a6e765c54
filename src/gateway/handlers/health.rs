//! Health check handler

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::ApiResponse;
use super::helpers::now_ms;

/// Health check response data
#[derive(serde::Serialize, ToSchema)]
pub struct HealthResponse {
    pub healthy: bool,
    /// Server timestamp in milliseconds
    #[schema(example = 1703494800000_u64)]
    pub timestamp_ms: u64,
    /// Currently published ETH/USD price
    #[schema(value_type = String, example = "3500")]
    pub price: Decimal,
}

/// Health check endpoint
///
/// Process liveness only. Makes no network calls and always answers 200;
/// chain reachability is reported by `/status`.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service alive", body = HealthResponse, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::success(HealthResponse {
            healthy: true,
            timestamp_ms: now_ms(),
            price: state.price.price().await,
        })),
    )
}
