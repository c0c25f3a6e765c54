//! Custody Gateway
//!
//! Outbound ETH transfers from a single custodial account over HTTP.
//!
//! # Modules
//!
//! - [`chain`] - JSON-RPC nodes and live endpoint selection
//! - [`price`] - ETH/USD price aggregation
//! - [`balance`] - Advisory balance cache and its refresher
//! - [`transfer`] - Withdrawal pipeline (validate, price, check, submit, confirm)
//! - [`ledger`] - In-memory record of every attempted transfer
//! - [`gateway`] - HTTP API
//! - [`money`] - wei / ETH / USD conversions
//! - [`poller`] - Periodic background tasks

pub mod balance;
pub mod chain;
pub mod config;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod money;
pub mod poller;
pub mod price;
pub mod transfer;

// Convenient re-exports at crate root
pub use config::AppConfig;
pub use ledger::{TransferLedger, TransferRecord};
pub use transfer::{TransferError, TransferPipeline, TransferReceipt, TransferRequest};
