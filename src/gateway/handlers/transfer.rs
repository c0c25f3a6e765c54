//! Outbound transfer handler
//!
//! One handler behind every transfer route; the body is normalized by
//! `TransferBody` and the pipeline does the rest.

use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, TransferBody, ok};
use crate::transfer::{TransferReceipt, TransferRequest};

/// Paths served by [`create_transfer`]
pub const TRANSFER_ROUTES: &[&str] = &[
    "/withdraw",
    "/convert",
    "/send-eth",
    "/transfer",
    "/coinbase-withdraw",
    "/send-to-coinbase",
    "/backend-to-coinbase",
    "/treasury-to-coinbase",
    "/fund-from-earnings",
];

/// Send ETH from the custodial account
///
/// Also served at `/convert`, `/send-eth`, `/transfer`, `/coinbase-withdraw`,
/// `/send-to-coinbase`, `/backend-to-coinbase`, `/treasury-to-coinbase` and
/// `/fund-from-earnings`. Blocks until the transaction is confirmed or fails.
#[utoipa::path(
    post,
    path = "/withdraw",
    request_body(content = TransferBody, description = "Destination plus one of amount, amountUSD or percentage", content_type = "application/json"),
    responses(
        (status = 200, description = "Transfer confirmed", body = TransferReceipt, content_type = "application/json"),
        (status = 400, description = "Invalid destination or amount, or insufficient funds"),
        (status = 500, description = "No endpoint, submission or confirmation failure")
    ),
    tag = "Transfer"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TransferBody>, JsonRejection>,
) -> ApiResult<TransferReceipt> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let req = TransferRequest::from(body);

    let receipt = state.pipeline.spawn_execute(req).await?;
    ok(receipt)
}
