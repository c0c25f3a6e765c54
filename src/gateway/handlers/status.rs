//! Service identity, status and balance handlers

use std::sync::Arc;

use axum::extract::State;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::super::state::AppState;
use super::super::types::{ApiResult, ok};
use super::helpers::live_balance;
use crate::balance::BalanceSnapshot;
use crate::money::eth_to_usd;

pub const SERVICE_NAME: &str = "custody-gateway";

const FEATURES: &[&str] = &[
    "eth-withdrawal",
    "usd-denominated-amounts",
    "percentage-of-balance",
    "rpc-failover",
    "live-price-feed",
    "transfer-ledger",
];

#[derive(Serialize, ToSchema)]
pub struct CachedBalance {
    #[schema(value_type = String)]
    pub eth: Decimal,
    #[schema(value_type = String)]
    pub usd: Decimal,
    pub last_checked: Option<DateTime<Utc>>,
    /// `rpc` or `explorer`
    #[schema(value_type = Option<String>)]
    pub source: Option<crate::balance::BalanceSource>,
}

#[derive(Serialize, ToSchema)]
pub struct ServiceInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
    pub address: String,
    pub network: String,
    /// Periodically refreshed, may be stale
    pub cached_balance: CachedBalance,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub features: Vec<&'static str>,
    pub uptime_secs: i64,
}

/// Service identity
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service identity and cached figures", body = ServiceInfo, content_type = "application/json")
    ),
    tag = "System"
)]
pub async fn service_info(State(state): State<Arc<AppState>>) -> ApiResult<ServiceInfo> {
    let price = state.price.price().await;
    let BalanceSnapshot {
        value,
        last_checked,
        source,
        ..
    } = state.balance_cache.snapshot().await;

    ok(ServiceInfo {
        service: SERVICE_NAME,
        version: env!("CARGO_PKG_VERSION"),
        git_hash: env!("GIT_HASH"),
        address: state.custody_address.clone(),
        network: state.network.clone(),
        cached_balance: CachedBalance {
            eth: value,
            usd: eth_to_usd(value, price),
            last_checked,
            source,
        },
        price,
        features: FEATURES.to_vec(),
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    pub address: String,
    pub network: String,
    #[schema(value_type = String)]
    pub balance_eth: Decimal,
    #[schema(value_type = String)]
    pub balance_usd: Decimal,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub last_price_update: Option<DateTime<Utc>>,
    /// Live balance is at least the minimum operating balance
    pub can_transfer: bool,
    #[schema(value_type = String)]
    pub min_operating_balance: Decimal,
    /// Host of the endpoint that answered
    pub endpoint: String,
    /// Ledger size
    pub transactions: usize,
}

/// Live status
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Live balance and readiness", body = StatusResponse, content_type = "application/json"),
        (status = 500, description = "No endpoint reachable")
    ),
    tag = "System"
)]
pub async fn get_status(State(state): State<Arc<AppState>>) -> ApiResult<StatusResponse> {
    let live = live_balance(&state).await?;
    let price = state.price.snapshot().await;

    ok(StatusResponse {
        address: state.custody_address.clone(),
        network: state.network.clone(),
        balance_eth: live.eth,
        balance_usd: eth_to_usd(live.eth, price.price),
        price: price.price,
        last_price_update: price.last_update,
        can_transfer: live.eth >= state.min_operating_balance,
        min_operating_balance: state.min_operating_balance,
        endpoint: live.endpoint,
        transactions: state.ledger.len(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct BalanceResponse {
    pub address: String,
    pub network: String,
    #[schema(value_type = String)]
    pub balance_eth: Decimal,
    #[schema(value_type = String)]
    pub balance_usd: Decimal,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub endpoint: String,
}

/// Live custodial balance
///
/// Also served at `/wallet/balance`.
#[utoipa::path(
    get,
    path = "/balance",
    responses(
        (status = 200, description = "Live balance", body = BalanceResponse, content_type = "application/json"),
        (status = 500, description = "No endpoint reachable")
    ),
    tag = "Balance"
)]
pub async fn get_balance(State(state): State<Arc<AppState>>) -> ApiResult<BalanceResponse> {
    let live = live_balance(&state).await?;
    let price = state.price.price().await;

    ok(BalanceResponse {
        address: state.custody_address.clone(),
        network: state.network.clone(),
        balance_eth: live.eth,
        balance_usd: eth_to_usd(live.eth, price),
        price,
        endpoint: live.endpoint,
    })
}
