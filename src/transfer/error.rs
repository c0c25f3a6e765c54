//! Transfer Error Types

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::chain::{ChainError, RpcError};
use crate::ledger::FailureKind;

/// Shortfall detail returned with an insufficient-funds rejection (all ETH
/// except `price`, which is USD per ETH)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Shortfall {
    #[schema(value_type = String)]
    pub available: Decimal,
    #[schema(value_type = String)]
    pub requested: Decimal,
    #[schema(value_type = String)]
    pub fee_estimate: Decimal,
    #[schema(value_type = String)]
    pub total_needed: Decimal,
    #[schema(value_type = String)]
    pub max_withdrawable: Decimal,
    #[schema(value_type = String)]
    pub price: Decimal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Invalid destination address: {0}")]
    InvalidDestination(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error(
        "Insufficient funds: need {} ETH (amount + fee), have {} ETH",
        .0.total_needed,
        .0.available
    )]
    InsufficientFunds(Box<Shortfall>),

    // === Pre-submission infra ===
    #[error("{0}")]
    AllEndpointsUnavailable(String),

    #[error("Network read failed: {0}")]
    Rpc(RpcError),

    // === Post-submission ===
    #[error("Transaction submission failed: {0}")]
    SubmissionFailed(RpcError),

    #[error("Transaction {tx_hash} not confirmed: {reason}")]
    ConfirmationFailed { tx_hash: String, reason: RpcError },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ChainError> for TransferError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::AllEndpointsUnavailable(_) => {
                TransferError::AllEndpointsUnavailable(err.to_string())
            }
            ChainError::Config(msg) => TransferError::Internal(msg),
        }
    }
}

impl TransferError {
    /// Stable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidDestination(_) => "INVALID_DESTINATION",
            TransferError::InvalidAmount(_) => "INVALID_AMOUNT",
            TransferError::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            TransferError::AllEndpointsUnavailable(_) => "ALL_ENDPOINTS_UNAVAILABLE",
            TransferError::Rpc(_) => "RPC_ERROR",
            TransferError::SubmissionFailed(_) => "SUBMISSION_FAILED",
            TransferError::ConfirmationFailed { .. } => "CONFIRMATION_FAILED",
            TransferError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            TransferError::InvalidDestination(_)
            | TransferError::InvalidAmount(_)
            | TransferError::InsufficientFunds(_) => 400,
            TransferError::AllEndpointsUnavailable(_)
            | TransferError::Rpc(_)
            | TransferError::SubmissionFailed(_)
            | TransferError::ConfirmationFailed { .. }
            | TransferError::Internal(_) => 500,
        }
    }

    /// Error code the node attached, when there is one
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            TransferError::Rpc(e) | TransferError::SubmissionFailed(e) => e.node_code(),
            TransferError::ConfirmationFailed { reason, .. } => reason.node_code(),
            _ => None,
        }
    }

    /// Hash of a transaction that reached the network despite the failure
    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            TransferError::ConfirmationFailed { tx_hash, .. } => Some(tx_hash),
            _ => None,
        }
    }

    /// Ledger classification; `None` for failures that are not recorded
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            TransferError::InvalidDestination(_) => None,
            TransferError::InvalidAmount(_) | TransferError::InsufficientFunds(_) => {
                Some(FailureKind::Rejected)
            }
            TransferError::AllEndpointsUnavailable(_)
            | TransferError::Rpc(_)
            | TransferError::Internal(_) => Some(FailureKind::Unavailable),
            TransferError::SubmissionFailed(_) => Some(FailureKind::SubmissionFailed),
            TransferError::ConfirmationFailed { .. } => Some(FailureKind::ConfirmationFailed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(TransferError::InvalidDestination("x".into()).http_status(), 400);
        assert_eq!(TransferError::InvalidAmount("zero".into()).http_status(), 400);
        assert_eq!(
            TransferError::AllEndpointsUnavailable("down".into()).http_status(),
            500
        );
        assert_eq!(
            TransferError::SubmissionFailed(RpcError::Connection("reset".into())).http_status(),
            500
        );
    }

    #[test]
    fn test_rpc_code_passthrough() {
        let err = TransferError::SubmissionFailed(RpcError::Node {
            code: -32000,
            message: "insufficient funds for gas * price + value".into(),
        });
        assert_eq!(err.rpc_code(), Some(-32000));
        assert_eq!(err.code(), "SUBMISSION_FAILED");
        assert_eq!(TransferError::InvalidAmount("x".into()).rpc_code(), None);
    }

    #[test]
    fn test_invalid_destination_not_recorded() {
        assert_eq!(
            TransferError::InvalidDestination("0x12".into()).failure_kind(),
            None
        );
        let err = TransferError::ConfirmationFailed {
            tx_hash: "0xabc".into(),
            reason: RpcError::Reverted("0xabc".into()),
        };
        assert_eq!(err.failure_kind(), Some(FailureKind::ConfirmationFailed));
        assert_eq!(err.tx_hash(), Some("0xabc"));
    }

    #[test]
    fn test_insufficient_funds_message() {
        let err = TransferError::InsufficientFunds(Box::new(Shortfall {
            available: Decimal::new(5, 1),
            requested: Decimal::ONE,
            fee_estimate: Decimal::new(126, 5),
            total_needed: Decimal::new(100_126, 5),
            max_withdrawable: Decimal::new(49_824, 5),
            price: Decimal::from(3500),
        }));
        assert_eq!(
            err.to_string(),
            "Insufficient funds: need 1.00126 ETH (amount + fee), have 0.5 ETH"
        );
    }
}
