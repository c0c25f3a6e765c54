//! Scripted in-memory node for tests
//!
//! Counts every call and debits value plus fee from its balance on a
//! successful send, so sequential transfers observe each other.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::error::RpcError;
use super::node::{ChainNode, TransferTx, TxReceipt};

pub const ONE_ETH: u128 = 1_000_000_000_000_000_000;
pub const GWEI: u128 = 1_000_000_000;

pub struct MockNode {
    endpoint: String,
    balance_wei: Mutex<u128>,
    gas_price_wei: u128,
    probe_fails: bool,
    probe_delay: Option<Duration>,
    balance_fails: bool,
    send_error: Option<RpcError>,
    receipt_error: Option<RpcError>,
    receipt_delay: Option<Duration>,
    reverts: bool,
    omits_effective_price: bool,
    block: AtomicU64,
    probe_calls: AtomicUsize,
    balance_calls: AtomicUsize,
    gas_calls: AtomicUsize,
    send_calls: AtomicUsize,
    receipt_calls: AtomicUsize,
    sent: Mutex<Vec<TransferTx>>,
}

impl MockNode {
    /// Live node holding 1 ETH at a 30 gwei gas price
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            balance_wei: Mutex::new(ONE_ETH),
            gas_price_wei: 30 * GWEI,
            probe_fails: false,
            probe_delay: None,
            balance_fails: false,
            send_error: None,
            receipt_error: None,
            receipt_delay: None,
            reverts: false,
            omits_effective_price: false,
            block: AtomicU64::new(19_000_000),
            probe_calls: AtomicUsize::new(0),
            balance_calls: AtomicUsize::new(0),
            gas_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            receipt_calls: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn with_balance_wei(self, wei: u128) -> Self {
        *self.balance_wei.lock().unwrap() = wei;
        self
    }

    pub fn with_gas_price_wei(mut self, wei: u128) -> Self {
        self.gas_price_wei = wei;
        self
    }

    pub fn failing_probe(mut self) -> Self {
        self.probe_fails = true;
        self
    }

    pub fn with_probe_delay(mut self, delay: Duration) -> Self {
        self.probe_delay = Some(delay);
        self
    }

    pub fn failing_balance(mut self) -> Self {
        self.balance_fails = true;
        self
    }

    pub fn failing_send(mut self, error: RpcError) -> Self {
        self.send_error = Some(error);
        self
    }

    pub fn failing_receipt(mut self, error: RpcError) -> Self {
        self.receipt_error = Some(error);
        self
    }

    pub fn with_receipt_delay(mut self, delay: Duration) -> Self {
        self.receipt_delay = Some(delay);
        self
    }

    pub fn reverting(mut self) -> Self {
        self.reverts = true;
        self
    }

    /// Receipts without `effectiveGasPrice`
    pub fn without_effective_price(mut self) -> Self {
        self.omits_effective_price = true;
        self
    }

    pub fn balance(&self) -> u128 {
        *self.balance_wei.lock().unwrap()
    }

    pub fn probe_calls(&self) -> usize {
        self.probe_calls.load(Ordering::SeqCst)
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn send_calls(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    /// Every call made against this node
    pub fn total_calls(&self) -> usize {
        self.probe_calls()
            + self.balance_calls()
            + self.gas_calls.load(Ordering::SeqCst)
            + self.send_calls()
            + self.receipt_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<TransferTx> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainNode for MockNode {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn block_number(&self) -> Result<u64, RpcError> {
        self.probe_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.probe_delay {
            tokio::time::sleep(delay).await;
        }
        if self.probe_fails {
            return Err(RpcError::Connection("connection refused".into()));
        }
        Ok(self.block.load(Ordering::SeqCst))
    }

    async fn balance_wei(&self, _address: &str) -> Result<u128, RpcError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if self.balance_fails {
            return Err(RpcError::Connection("connection reset".into()));
        }
        Ok(self.balance())
    }

    async fn gas_price_wei(&self) -> Result<u128, RpcError> {
        self.gas_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.gas_price_wei)
    }

    async fn send_transfer(&self, tx: &TransferTx) -> Result<String, RpcError> {
        let n = self.send_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.send_error {
            return Err(err.clone());
        }

        let fee = self.gas_price_wei * tx.gas_limit as u128;
        {
            let mut balance = self.balance_wei.lock().unwrap();
            *balance = balance.saturating_sub(tx.value_wei + fee);
        }
        self.sent.lock().unwrap().push(tx.clone());
        Ok(format!("0x{:064x}", n + 1))
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, RpcError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.receipt_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.receipt_error {
            return Err(err.clone());
        }

        Ok(TxReceipt {
            tx_hash: tx_hash.to_string(),
            block_number: self.block.fetch_add(1, Ordering::SeqCst) + 1,
            gas_used: 21_000,
            effective_gas_price: (!self.omits_effective_price).then_some(self.gas_price_wei),
            success: !self.reverts,
        })
    }
}
