use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::RwLock;

/// Last accepted quote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSnapshot {
    pub price: Decimal,
    /// `None` until the first quote is accepted
    pub last_update: Option<DateTime<Utc>>,
    pub source: Option<String>,
}

/// Process-wide published price
///
/// Written only by the price aggregator; everyone else reads snapshots.
#[derive(Debug)]
pub struct PriceState {
    inner: RwLock<PriceSnapshot>,
}

impl PriceState {
    pub fn new(default_price: Decimal) -> Self {
        Self {
            inner: RwLock::new(PriceSnapshot {
                price: default_price,
                last_update: None,
                source: None,
            }),
        }
    }

    pub async fn snapshot(&self) -> PriceSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn price(&self) -> Decimal {
        self.inner.read().await.price
    }

    pub(crate) async fn publish(&self, price: Decimal, source: &str) {
        let mut guard = self.inner.write().await;
        guard.price = price;
        guard.last_update = Some(Utc::now());
        guard.source = Some(source.to_string());
    }
}
