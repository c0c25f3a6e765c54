//! Block explorer balance lookup (Etherscan-compatible account API)

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::ExplorerConfig;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExplorerError {
    #[error("Explorer request failed: {0}")]
    Http(String),

    #[error("Explorer returned HTTP {0}")]
    Status(u16),

    #[error("Explorer rejected query: {0}")]
    Rejected(String),

    #[error("Invalid explorer balance: {0}")]
    Parse(String),
}

#[async_trait]
pub trait BalanceLookup: Send + Sync {
    async fn balance_wei(&self, address: &str) -> Result<u128, ExplorerError>;
}

#[derive(Debug, Deserialize)]
struct ExplorerResponse {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

pub struct ExplorerClient {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
}

impl ExplorerClient {
    pub fn new(config: &ExplorerConfig) -> Result<Self, ExplorerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ExplorerError::Http(e.to_string()))?;

        Ok(Self {
            client,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

/// Accept only `status == "1"` with a decimal wei string
fn parse_balance(resp: ExplorerResponse) -> Result<u128, ExplorerError> {
    if resp.status != "1" {
        let detail = match resp.result.as_str() {
            Some(r) if !r.is_empty() => format!("{} ({})", resp.message, r),
            _ => resp.message,
        };
        return Err(ExplorerError::Rejected(detail));
    }

    let text = resp
        .result
        .as_str()
        .ok_or_else(|| ExplorerError::Parse(resp.result.to_string()))?;
    text.parse::<u128>()
        .map_err(|_| ExplorerError::Parse(text.to_string()))
}

#[async_trait]
impl BalanceLookup for ExplorerClient {
    async fn balance_wei(&self, address: &str) -> Result<u128, ExplorerError> {
        let mut query = vec![
            ("module", "account"),
            ("action", "balance"),
            ("address", address),
            ("tag", "latest"),
        ];
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.as_str()));
        }

        let resp = self
            .client
            .get(&self.url)
            .query(&query)
            .send()
            .await
            .map_err(|e| ExplorerError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ExplorerError::Status(resp.status().as_u16()));
        }

        let body: ExplorerResponse = resp
            .json()
            .await
            .map_err(|e| ExplorerError::Parse(e.to_string()))?;
        parse_balance(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(v: serde_json::Value) -> ExplorerResponse {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_accepts_status_one() {
        let resp = response(json!({
            "status": "1",
            "message": "OK",
            "result": "1250000000000000000"
        }));
        assert_eq!(parse_balance(resp).unwrap(), 1_250_000_000_000_000_000);
    }

    #[test]
    fn test_rejects_other_status() {
        let resp = response(json!({
            "status": "0",
            "message": "NOTOK",
            "result": "Invalid API Key"
        }));
        assert_eq!(
            parse_balance(resp),
            Err(ExplorerError::Rejected("NOTOK (Invalid API Key)".into()))
        );
    }

    #[test]
    fn test_rejects_non_numeric_result() {
        let resp = response(json!({"status": "1", "message": "OK", "result": "lots"}));
        assert!(matches!(parse_balance(resp), Err(ExplorerError::Parse(_))));
    }
}
