//! Chain access: JSON-RPC node handles and endpoint failover

pub mod address;
pub mod error;
pub mod node;
pub mod rpc;
pub mod selector;

#[cfg(test)]
pub mod mock;

pub use error::{ChainError, EndpointFailure, RpcError};
pub use node::{ChainNode, TransferTx, TxReceipt};
pub use selector::EndpointSelector;
