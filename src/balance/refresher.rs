//! Periodic custodial balance refresh
//!
//! RPC through the endpoint selector first, the block explorer second. When
//! both fail the cached value is left alone.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::cache::{BalanceCache, BalanceSource};
use super::explorer::{BalanceLookup, ExplorerError};
use crate::chain::address::endpoint_host;
use crate::chain::{ChainError, EndpointSelector, RpcError};
use crate::config::BalanceConfig;
use crate::money::{MoneyError, wei_to_eth};
use crate::poller::PollerHandle;

#[derive(Debug, Error)]
pub enum BalanceError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Explorer(#[from] ExplorerError),

    #[error(transparent)]
    Money(#[from] MoneyError),

    #[error("Balance unavailable (rpc: {rpc}; explorer: {explorer})")]
    Unavailable { rpc: String, explorer: String },
}

pub struct BalanceRefresher {
    selector: Arc<EndpointSelector>,
    explorer: Option<Arc<dyn BalanceLookup>>,
    cache: Arc<BalanceCache>,
    address: String,
    initial_delay: Duration,
    poll_interval: Duration,
}

impl BalanceRefresher {
    pub fn new(
        selector: Arc<EndpointSelector>,
        explorer: Option<Arc<dyn BalanceLookup>>,
        cache: Arc<BalanceCache>,
        address: String,
        config: &BalanceConfig,
    ) -> Self {
        Self {
            selector,
            explorer,
            cache,
            address,
            initial_delay: Duration::from_secs(config.initial_delay_secs),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        }
    }

    async fn read_via_rpc(&self) -> Result<(Decimal, String), BalanceError> {
        let node = self.selector.acquire_live_endpoint().await?;
        let wei = node.balance_wei(&self.address).await?;
        Ok((wei_to_eth(wei)?, endpoint_host(node.endpoint()).to_string()))
    }

    async fn read_via_explorer(&self) -> Result<Decimal, BalanceError> {
        let explorer = self.explorer.as_ref().ok_or_else(|| {
            BalanceError::Explorer(ExplorerError::Rejected("no explorer configured".into()))
        })?;
        let wei = explorer.balance_wei(&self.address).await?;
        Ok(wei_to_eth(wei)?)
    }

    /// One refresh; returns the value written to the cache
    pub async fn refresh_once(&self) -> Result<Decimal, BalanceError> {
        let rpc_err = match self.read_via_rpc().await {
            Ok((value, endpoint)) => {
                self.cache
                    .publish(value, BalanceSource::Rpc, Some(endpoint))
                    .await;
                debug!(%value, "Balance refreshed via RPC");
                return Ok(value);
            }
            Err(e) => e,
        };

        warn!(error = %rpc_err, "RPC balance read failed, falling back to explorer");

        match self.read_via_explorer().await {
            Ok(value) => {
                self.cache.publish(value, BalanceSource::Explorer, None).await;
                debug!(%value, "Balance refreshed via explorer");
                Ok(value)
            }
            Err(explorer_err) => Err(BalanceError::Unavailable {
                rpc: rpc_err.to_string(),
                explorer: explorer_err.to_string(),
            }),
        }
    }

    pub fn spawn(self) -> PollerHandle {
        info!(
            address = %self.address,
            explorer = self.explorer.is_some(),
            "Balance refresh every {:?}", self.poll_interval
        );
        let delay = self.initial_delay;
        let interval = self.poll_interval;
        let this = Arc::new(self);

        PollerHandle::spawn("balance", delay, interval, move || {
            let this = Arc::clone(&this);
            async move {
                if let Err(e) = this.refresh_once().await {
                    warn!(error = %e, "Balance refresh failed, keeping cached value");
                }
            }
        })
    }
}
