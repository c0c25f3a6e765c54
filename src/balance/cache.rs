use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::RwLock;

/// Where the cached value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceSource {
    Rpc,
    Explorer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSnapshot {
    pub value: Decimal,
    pub last_checked: Option<DateTime<Utc>>,
    /// Host of the RPC endpoint that answered, if any
    pub connected_endpoint: Option<String>,
    pub source: Option<BalanceSource>,
}

/// Advisory custodial balance for status displays
///
/// Transfers never consult this; they read the balance live.
#[derive(Debug)]
pub struct BalanceCache {
    inner: RwLock<BalanceSnapshot>,
}

impl Default for BalanceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BalanceCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(BalanceSnapshot {
                value: Decimal::ZERO,
                last_checked: None,
                connected_endpoint: None,
                source: None,
            }),
        }
    }

    pub async fn snapshot(&self) -> BalanceSnapshot {
        self.inner.read().await.clone()
    }

    pub(crate) async fn publish(
        &self,
        value: Decimal,
        source: BalanceSource,
        endpoint: Option<String>,
    ) {
        let mut guard = self.inner.write().await;
        guard.value = value;
        guard.last_checked = Some(Utc::now());
        guard.source = Some(source);
        // Keep the last known endpoint when the explorer answered instead
        if endpoint.is_some() {
            guard.connected_endpoint = endpoint;
        }
    }
}
