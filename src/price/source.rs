//! External price sources

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;

use super::error::PriceError;
use crate::config::PriceSourceConfig;

#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    /// One quote in USD per ETH
    async fn fetch(&self) -> Result<Decimal, PriceError>;
}

/// JSON-over-HTTP quote, extracted with a JSON pointer
pub struct HttpPriceSource {
    name: String,
    url: String,
    pointer: String,
    client: reqwest::Client,
}

impl HttpPriceSource {
    pub fn new(config: &PriceSourceConfig, timeout: Duration) -> Result<Self, PriceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PriceError::Http(e.to_string()))?;

        Ok(Self {
            name: config.name.clone(),
            url: config.url.clone(),
            pointer: config.pointer.clone(),
            client,
        })
    }
}

#[async_trait]
impl PriceSource for HttpPriceSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Decimal, PriceError> {
        let resp = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                PriceError::Timeout
            } else {
                PriceError::Http(e.to_string())
            }
        })?;

        if !resp.status().is_success() {
            return Err(PriceError::Status(resp.status().as_u16()));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| PriceError::Http(e.to_string()))?;

        extract_price(&body, &self.pointer)
    }
}

/// Pull a number, or a numeric string, out of `body`
pub fn extract_price(body: &Value, pointer: &str) -> Result<Decimal, PriceError> {
    let value = body
        .pointer(pointer)
        .ok_or_else(|| PriceError::MissingField(pointer.to_string()))?;

    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => return Err(PriceError::NotANumber(other.to_string())),
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| PriceError::NotANumber(text))
}

#[cfg(test)]
pub use tests::StaticSource;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fixed answer, counts fetches
    pub struct StaticSource {
        name: String,
        answer: Result<Decimal, PriceError>,
        calls: AtomicUsize,
    }

    impl StaticSource {
        pub fn ok(name: &str, price: Decimal) -> Self {
            Self {
                name: name.to_string(),
                answer: Ok(price),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn failing(name: &str) -> Self {
            Self {
                name: name.to_string(),
                answer: Err(PriceError::Http("connection refused".into())),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PriceSource for StaticSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch(&self) -> Result<Decimal, PriceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone()
        }
    }

    #[test]
    fn test_extract_numeric_string() {
        // Binance ticker shape
        let body = json!({"symbol": "ETHUSDT", "price": "3521.45000000"});
        assert_eq!(
            extract_price(&body, "/price").unwrap(),
            Decimal::from_str("3521.45").unwrap()
        );
    }

    #[test]
    fn test_extract_number() {
        // CoinGecko simple price shape
        let body = json!({"ethereum": {"usd": 3498.2}});
        assert_eq!(
            extract_price(&body, "/ethereum/usd").unwrap(),
            Decimal::from_str("3498.2").unwrap()
        );

        let body = json!({"ethereum": {"usd": 3500}});
        assert_eq!(
            extract_price(&body, "/ethereum/usd").unwrap(),
            Decimal::from(3500)
        );
    }

    #[test]
    fn test_extract_missing_or_garbage() {
        let body = json!({"data": {"amount": null}});
        assert!(matches!(
            extract_price(&body, "/data/base"),
            Err(PriceError::MissingField(_))
        ));
        assert!(matches!(
            extract_price(&body, "/data/amount"),
            Err(PriceError::NotANumber(_))
        ));

        let body = json!({"data": {"amount": "n/a"}});
        assert!(matches!(
            extract_price(&body, "/data/amount"),
            Err(PriceError::NotANumber(_))
        ));
    }
}
