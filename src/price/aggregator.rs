//! Price feed poller
//!
//! Sources are tried in priority order on every tick and the first quote
//! inside the sanity band is published. When no source delivers, the
//! published price stays where it was.

use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::error::PriceError;
use super::source::{HttpPriceSource, PriceSource};
use super::state::PriceState;
use crate::config::PriceConfig;
use crate::poller::PollerHandle;

pub struct PriceAggregator {
    sources: Vec<Arc<dyn PriceSource>>,
    state: Arc<PriceState>,
    min_plausible: Decimal,
    max_plausible: Decimal,
    request_timeout: Duration,
    poll_interval: Duration,
}

impl PriceAggregator {
    pub fn new(
        sources: Vec<Arc<dyn PriceSource>>,
        state: Arc<PriceState>,
        config: &PriceConfig,
    ) -> Self {
        Self {
            sources,
            state,
            min_plausible: config.min_plausible,
            max_plausible: config.max_plausible,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
        }
    }

    pub fn from_config(config: &PriceConfig, state: Arc<PriceState>) -> Result<Self, PriceError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let sources = config
            .sources
            .iter()
            .map(|s| HttpPriceSource::new(s, timeout).map(|src| Arc::new(src) as Arc<dyn PriceSource>))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(sources, state, config))
    }

    fn check_band(&self, price: Decimal) -> Result<Decimal, PriceError> {
        if price > self.min_plausible && price < self.max_plausible {
            Ok(price)
        } else {
            Err(PriceError::OutOfBand {
                price,
                min: self.min_plausible,
                max: self.max_plausible,
            })
        }
    }

    async fn fetch_checked(&self, source: &dyn PriceSource) -> Result<Decimal, PriceError> {
        let price = tokio::time::timeout(self.request_timeout, source.fetch())
            .await
            .map_err(|_| PriceError::Timeout)??;
        self.check_band(price)
    }

    /// One pass over the sources; returns the published price
    pub async fn poll_once(&self) -> Result<Decimal, PriceError> {
        for source in &self.sources {
            match self.fetch_checked(source.as_ref()).await {
                Ok(price) => {
                    self.state.publish(price, source.name()).await;
                    debug!(source = source.name(), %price, "Price updated");
                    return Ok(price);
                }
                Err(e) => {
                    debug!(source = source.name(), error = %e, "Price source rejected");
                }
            }
        }

        Err(PriceError::AllSourcesFailed(self.sources.len()))
    }

    /// Poll immediately, then every `poll_interval`
    pub fn spawn(self) -> PollerHandle {
        info!(
            sources = self.sources.len(),
            "Price feed polling every {:?}", self.poll_interval
        );
        let interval = self.poll_interval;
        let this = Arc::new(self);

        PollerHandle::spawn("price", Duration::ZERO, interval, move || {
            let this = Arc::clone(&this);
            async move {
                if let Err(e) = this.poll_once().await {
                    let current = this.state.price().await;
                    warn!(error = %e, %current, "Price feed stale, keeping last price");
                }
            }
        })
    }
}
