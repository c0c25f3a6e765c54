use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;

use crate::balance::BalanceCache;
use crate::chain::EndpointSelector;
use crate::ledger::TransferLedger;
use crate::price::PriceState;
use crate::transfer::TransferPipeline;

/// Gateway shared state
pub struct AppState {
    pub pipeline: Arc<TransferPipeline>,
    /// Live chain reads for the balance and status routes
    pub selector: Arc<EndpointSelector>,
    pub price: Arc<PriceState>,
    /// Advisory only, shown on `/`
    pub balance_cache: Arc<BalanceCache>,
    pub ledger: Arc<TransferLedger>,
    pub custody_address: String,
    pub network: String,
    /// `/status` reports `can_transfer` at or above this balance
    pub min_operating_balance: Decimal,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pipeline: Arc<TransferPipeline>,
        selector: Arc<EndpointSelector>,
        price: Arc<PriceState>,
        balance_cache: Arc<BalanceCache>,
        ledger: Arc<TransferLedger>,
        custody_address: String,
        network: String,
        min_operating_balance: Decimal,
    ) -> Self {
        Self {
            pipeline,
            selector,
            price,
            balance_cache,
            ledger,
            custody_address,
            network,
            min_operating_balance,
            started_at: Utc::now(),
        }
    }
}
