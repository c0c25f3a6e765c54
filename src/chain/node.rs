use async_trait::async_trait;

use super::error::RpcError;

/// Live network handle bound to one endpoint
///
/// Everything the transfer pipeline needs from the chain goes through this
/// trait: probing, balance reads, fee quotes, submission and the receipt wait.
#[async_trait]
pub trait ChainNode: Send + Sync {
    /// Endpoint URL this handle talks to
    fn endpoint(&self) -> &str;

    /// Latest block height; doubles as the liveness probe
    async fn block_number(&self) -> Result<u64, RpcError>;

    /// Balance of `address` at the latest block, in wei
    async fn balance_wei(&self, address: &str) -> Result<u128, RpcError>;

    /// Current gas price, in wei
    async fn gas_price_wei(&self) -> Result<u128, RpcError>;

    /// Hand a signed transfer to the network and return its hash
    async fn send_transfer(&self, tx: &TransferTx) -> Result<String, RpcError>;

    /// Block until the transaction is included once
    ///
    /// Bounded by the handle's own confirmation timeout.
    async fn wait_for_receipt(&self, tx_hash: &str) -> Result<TxReceipt, RpcError>;
}

/// EIP-1559 plain value transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTx {
    pub from: String,
    pub to: String,
    pub value_wei: u128,
    pub gas_limit: u64,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// Inclusion receipt of a submitted transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub gas_used: u64,
    /// Absent on nodes that predate EIP-1559 receipts
    pub effective_gas_price: Option<u128>,
    pub success: bool,
}

impl TxReceipt {
    /// Fee actually paid for inclusion, if the node reported the price
    pub fn fee_paid_wei(&self) -> Option<u128> {
        self.effective_gas_price
            .map(|price| price.saturating_mul(self.gas_used as u128))
    }

    /// Ceiling on the fee given the `max_fee_per_gas` the transfer was sent with
    pub fn max_fee_paid_wei(&self, max_fee_per_gas: u128) -> u128 {
        max_fee_per_gas.saturating_mul(self.gas_used as u128)
    }
}
