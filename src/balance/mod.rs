//! Cached custodial balance for status displays

pub mod cache;
pub mod explorer;
pub mod refresher;

pub use cache::{BalanceCache, BalanceSnapshot, BalanceSource};
pub use explorer::{BalanceLookup, ExplorerClient, ExplorerError};
pub use refresher::{BalanceError, BalanceRefresher};
