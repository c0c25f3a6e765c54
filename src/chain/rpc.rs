//! Ethereum JSON-RPC node handle
//!
//! Talks to a node over HTTP JSON-RPC. Signing is delegated: with a remote
//! signer configured the transaction is signed via `eth_signTransaction` and
//! broadcast with `eth_sendRawTransaction`, otherwise the node signs it
//! through `eth_sendTransaction`.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use super::error::RpcError;
use super::node::{ChainNode, TransferTx, TxReceipt};
use crate::config::{ChainConfig, SignerConfig};
use crate::money::{parse_hex_u64, parse_hex_u128, to_hex_quantity};

/// JSON-RPC request structure
#[derive(Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: &'static str,
    params: T,
    id: u64,
}

/// JSON-RPC response structure
#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Receipt as returned by `eth_getTransactionReceipt`
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EthReceipt {
    transaction_hash: String,
    block_number: String,
    gas_used: String,
    effective_gas_price: Option<String>,
    status: Option<String>,
}

/// HTTP JSON-RPC transport shared by the node and the signer
struct RpcTransport {
    client: reqwest::Client,
    url: String,
    bearer: Option<String>,
    next_id: AtomicU64,
}

impl RpcTransport {
    fn new(url: String, timeout: Duration, bearer: Option<String>) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Connection(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url,
            bearer,
            next_id: AtomicU64::new(1),
        })
    }

    /// Make a JSON-RPC call whose result may legitimately be `null`
    async fn call_opt<T, R>(&self, method: &'static str, params: T) -> Result<Option<R>, RpcError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let mut builder = self.client.post(&self.url).json(&request);
        if let Some(token) = &self.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                RpcError::Connection(format!("{} timed out: {}", method, e))
            } else {
                RpcError::Connection(format!("HTTP request failed: {}", e))
            }
        })?;

        let rpc_response: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| RpcError::Parse(format!("Failed to parse {} response: {}", method, e)))?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Node {
                code: error.code,
                message: error.message,
            });
        }

        Ok(rpc_response.result)
    }

    async fn call<T, R>(&self, method: &'static str, params: T) -> Result<R, RpcError>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        self.call_opt(method, params)
            .await?
            .ok_or(RpcError::EmptyResult(method))
    }
}

/// Node handle for one JSON-RPC endpoint
pub struct EthRpcNode {
    rpc: RpcTransport,
    signer: Option<RpcTransport>,
    receipt_poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl EthRpcNode {
    pub fn new(url: &str, config: &ChainConfig) -> Result<Self, RpcError> {
        debug!("Initializing RPC node handle for {}", url);

        let rpc = RpcTransport::new(url.to_string(), config.request_timeout(), None)?;
        let signer = Self::signer_transport(&config.signer, config.request_timeout())?;

        Ok(Self {
            rpc,
            signer,
            receipt_poll_interval: config.receipt_poll_interval(),
            confirmation_timeout: config.confirmation_timeout(),
        })
    }

    fn signer_transport(
        config: &SignerConfig,
        timeout: Duration,
    ) -> Result<Option<RpcTransport>, RpcError> {
        config
            .url
            .as_ref()
            .map(|url| RpcTransport::new(url.clone(), timeout, config.auth_token.clone()))
            .transpose()
    }

    fn tx_object(tx: &TransferTx) -> Value {
        json!({
            "type": "0x2",
            "from": tx.from,
            "to": tx.to,
            "value": to_hex_quantity(tx.value_wei),
            "gas": to_hex_quantity(tx.gas_limit as u128),
            "maxFeePerGas": to_hex_quantity(tx.max_fee_per_gas),
            "maxPriorityFeePerGas": to_hex_quantity(tx.max_priority_fee_per_gas),
        })
    }

    /// Sign through the remote signer and broadcast the raw transaction
    async fn sign_and_broadcast(
        &self,
        signer: &RpcTransport,
        tx: &TransferTx,
    ) -> Result<String, RpcError> {
        let nonce: String = self
            .rpc
            .call("eth_getTransactionCount", (&tx.from, "pending"))
            .await?;
        let chain_id: String = self.rpc.call("eth_chainId", ()).await?;

        let mut tx_obj = Self::tx_object(tx);
        tx_obj["nonce"] = Value::String(nonce);
        tx_obj["chainId"] = Value::String(chain_id);

        // Clef answers `{ raw, tx }`, web3signer answers the raw hex string
        let signed: Value = signer.call("eth_signTransaction", [tx_obj]).await?;
        let raw = match &signed {
            Value::String(raw) => raw.clone(),
            Value::Object(obj) => obj
                .get("raw")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| RpcError::Parse("signer response has no raw tx".into()))?,
            other => {
                return Err(RpcError::Parse(format!(
                    "unexpected signer response: {}",
                    other
                )));
            }
        };

        self.rpc.call("eth_sendRawTransaction", [raw]).await
    }

    async fn poll_receipt(&self, tx_hash: &str) -> Result<TxReceipt, RpcError> {
        loop {
            let receipt: Option<EthReceipt> = self
                .rpc
                .call_opt("eth_getTransactionReceipt", [tx_hash])
                .await?;

            if let Some(receipt) = receipt {
                return parse_receipt(receipt);
            }

            debug!(tx_hash = %tx_hash, "Receipt not yet available");
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }
}

fn parse_receipt(receipt: EthReceipt) -> Result<TxReceipt, RpcError> {
    let effective_gas_price = receipt
        .effective_gas_price
        .as_deref()
        .map(parse_hex_u128)
        .transpose()
        .map_err(|e| RpcError::Parse(e.to_string()))?;

    Ok(TxReceipt {
        block_number: parse_hex_u64(&receipt.block_number)
            .map_err(|e| RpcError::Parse(e.to_string()))?,
        gas_used: parse_hex_u64(&receipt.gas_used).map_err(|e| RpcError::Parse(e.to_string()))?,
        effective_gas_price,
        // Pre-Byzantium receipts carry no status; treat inclusion as success
        success: receipt.status.as_deref() != Some("0x0"),
        tx_hash: receipt.transaction_hash,
    })
}

#[async_trait]
impl ChainNode for EthRpcNode {
    fn endpoint(&self) -> &str {
        &self.rpc.url
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        let result: String = self.rpc.call("eth_blockNumber", ()).await?;
        parse_hex_u64(&result).map_err(|e| RpcError::Parse(format!("Invalid block number: {}", e)))
    }

    async fn balance_wei(&self, address: &str) -> Result<u128, RpcError> {
        let result: String = self.rpc.call("eth_getBalance", (address, "latest")).await?;
        parse_hex_u128(&result).map_err(|e| RpcError::Parse(format!("Invalid balance: {}", e)))
    }

    async fn gas_price_wei(&self) -> Result<u128, RpcError> {
        let result: String = self.rpc.call("eth_gasPrice", ()).await?;
        parse_hex_u128(&result).map_err(|e| RpcError::Parse(format!("Invalid gas price: {}", e)))
    }

    async fn send_transfer(&self, tx: &TransferTx) -> Result<String, RpcError> {
        let tx_hash = match &self.signer {
            Some(signer) => self.sign_and_broadcast(signer, tx).await?,
            None => {
                self.rpc
                    .call("eth_sendTransaction", [Self::tx_object(tx)])
                    .await?
            }
        };
        info!(tx_hash = %tx_hash, to = %tx.to, "Transaction accepted by {}", self.rpc.url);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, RpcError> {
        tokio::time::timeout(self.confirmation_timeout, self.poll_receipt(tx_hash))
            .await
            .map_err(|_| RpcError::Timeout {
                method: "eth_getTransactionReceipt",
                timeout: self.confirmation_timeout,
            })?
    }
}
