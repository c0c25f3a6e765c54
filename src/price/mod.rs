//! Live ETH/USD price feed

pub mod aggregator;
pub mod error;
pub mod source;
pub mod state;

pub use aggregator::PriceAggregator;
pub use error::PriceError;
pub use source::{HttpPriceSource, PriceSource};
pub use state::{PriceSnapshot, PriceState};
