use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RpcError {
    #[error("RPC connection failed: {0}")]
    Connection(String),

    #[error("RPC call {method} timed out after {timeout:?}")]
    Timeout {
        method: &'static str,
        timeout: Duration,
    },

    #[error("RPC error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("No result in RPC response for {0}")]
    EmptyResult(&'static str),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Transaction {0} reverted")]
    Reverted(String),
}

impl RpcError {
    /// Machine-readable code supplied by the node, if any
    pub fn node_code(&self) -> Option<i64> {
        match self {
            RpcError::Node { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// One endpoint that failed its liveness probe
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointFailure {
    pub endpoint: String,
    pub error: RpcError,
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.error)
    }
}

fn join_failures(failures: &[EndpointFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChainError {
    #[error("All RPC endpoints failed ({} tried): {}", .0.len(), join_failures(.0))]
    AllEndpointsUnavailable(Vec<EndpointFailure>),

    #[error("Configuration error: {0}")]
    Config(String),
}
