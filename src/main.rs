//! Custody Gateway
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │   HTTP   │───▶│ Pipeline │───▶│ Selector │───▶│ RPC node │
//! │ (axum)   │    │ (submit) │    │(failover)│    │          │
//! └──────────┘    └────┬─────┘    └──────────┘    └──────────┘
//!                      │
//!            ┌─────────┴─────────┐
//!            ▼                   ▼
//!      ┌──────────┐        ┌──────────┐
//!      │  Price   │        │  Ledger  │
//!      │ (poller) │        │          │
//!      └──────────┘        └──────────┘
//! ```
//!
//! Usage: `custody_gateway [--env dev|prod] [--port N]`

use anyhow::Context;
use std::sync::Arc;

use custody_gateway::balance::{BalanceCache, BalanceLookup, BalanceRefresher, ExplorerClient};
use custody_gateway::chain::EndpointSelector;
use custody_gateway::config::AppConfig;
use custody_gateway::gateway::{self, state::AppState};
use custody_gateway::ledger::TransferLedger;
use custody_gateway::price::{PriceAggregator, PriceState};
use custody_gateway::transfer::{PipelineSettings, TransferPipeline};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut config = AppConfig::load(&env).with_context(|| format!("loading {} config", env))?;
    if let Some(port) = get_port_override() {
        config.gateway.port = port;
    }
    let _log_guard = custody_gateway::logging::init_logging(&config);

    tracing::info!(
        env = %env,
        version = env!("CARGO_PKG_VERSION"),
        git_hash = env!("GIT_HASH"),
        "Starting custody gateway"
    );

    let selector = Arc::new(EndpointSelector::from_config(&config.chain)?);
    tracing::info!(endpoints = ?selector.endpoints(), "RPC endpoints configured");
    if config.chain.signer.url.is_none() {
        tracing::warn!("No signer configured, transactions will be signed by the node");
    }

    let price = Arc::new(PriceState::new(config.price.default_price));
    let aggregator = PriceAggregator::from_config(&config.price, price.clone())?;

    let balance_cache = Arc::new(BalanceCache::new());
    let explorer = config
        .balance
        .explorer
        .as_ref()
        .map(|cfg| ExplorerClient::new(cfg).map(|c| Arc::new(c) as Arc<dyn BalanceLookup>))
        .transpose()?;
    let refresher = BalanceRefresher::new(
        selector.clone(),
        explorer,
        balance_cache.clone(),
        config.custody.address.clone(),
        &config.balance,
    );

    let ledger = Arc::new(TransferLedger::new());
    let pipeline = Arc::new(TransferPipeline::new(
        selector.clone(),
        price.clone(),
        ledger.clone(),
        PipelineSettings::from_config(&config),
    ));

    let state = Arc::new(AppState::new(
        pipeline,
        selector,
        price,
        balance_cache,
        ledger,
        config.custody.address.clone(),
        config.chain.network.clone(),
        config.custody.min_operating_balance,
    ));

    let pollers = vec![aggregator.spawn(), refresher.spawn()];

    let served = gateway::run_server(
        &config.gateway.host,
        config.gateway.port,
        state,
        shutdown_signal(),
    )
    .await;

    for poller in pollers {
        poller.shutdown().await;
    }
    served.context("gateway server")?;

    tracing::info!("Custody gateway stopped");
    Ok(())
}
