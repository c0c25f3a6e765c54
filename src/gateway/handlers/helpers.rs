//! Handler helper functions
//!
//! Shared by the status and balance handlers.

use rust_decimal::Decimal;
use std::time::{SystemTime, UNIX_EPOCH};

use super::super::state::AppState;
use super::super::types::ApiError;
use crate::chain::address::endpoint_host;
use crate::transfer::TransferError;

/// Balance read from a live endpoint
pub struct LiveBalance {
    pub eth: Decimal,
    /// Host of the endpoint that answered
    pub endpoint: String,
}

/// Read the custodial balance from the first live endpoint
pub async fn live_balance(state: &AppState) -> Result<LiveBalance, ApiError> {
    let node = state
        .selector
        .acquire_live_endpoint()
        .await
        .map_err(|e| ApiError::from(TransferError::from(e)))?;

    let wei = node
        .balance_wei(&state.custody_address)
        .await
        .map_err(|e| ApiError::from(TransferError::Rpc(e)))?;
    let eth = crate::money::wei_to_eth(wei).map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(LiveBalance {
        eth,
        endpoint: endpoint_host(node.endpoint()).to_string(),
    })
}

/// Get current time in milliseconds
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
