//! Endpoint failover
//!
//! Every acquisition walks the configured endpoints in priority order and
//! hands back the first one that answers `eth_blockNumber` within the probe
//! timeout. Nothing is remembered between acquisitions, so a recovered
//! higher-priority endpoint is picked up on the next call.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::address::endpoint_host;
use super::error::{ChainError, EndpointFailure, RpcError};
use super::node::ChainNode;
use super::rpc::EthRpcNode;
use crate::config::ChainConfig;

pub struct EndpointSelector {
    nodes: Vec<Arc<dyn ChainNode>>,
    probe_timeout: Duration,
}

impl EndpointSelector {
    pub fn new(nodes: Vec<Arc<dyn ChainNode>>, probe_timeout: Duration) -> Self {
        Self {
            nodes,
            probe_timeout,
        }
    }

    /// One JSON-RPC handle per configured endpoint, in configured order
    pub fn from_config(config: &ChainConfig) -> Result<Self, ChainError> {
        if config.rpc_endpoints.is_empty() {
            return Err(ChainError::Config("no RPC endpoints configured".into()));
        }

        let nodes = config
            .rpc_endpoints
            .iter()
            .map(|url| {
                EthRpcNode::new(url, config)
                    .map(|node| Arc::new(node) as Arc<dyn ChainNode>)
                    .map_err(|e| ChainError::Config(format!("{}: {}", endpoint_host(url), e)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(nodes, config.probe_timeout()))
    }

    pub fn endpoints(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.endpoint()).collect()
    }

    pub async fn acquire_live_endpoint(&self) -> Result<Arc<dyn ChainNode>, ChainError> {
        let mut failures = Vec::with_capacity(self.nodes.len());

        for node in &self.nodes {
            let host = endpoint_host(node.endpoint());
            let probe = tokio::time::timeout(self.probe_timeout, node.block_number()).await;

            let error = match probe {
                Ok(Ok(block)) => {
                    debug!(endpoint = %host, block, "Endpoint is live");
                    return Ok(Arc::clone(node));
                }
                Ok(Err(e)) => e,
                Err(_) => RpcError::Timeout {
                    method: "eth_blockNumber",
                    timeout: self.probe_timeout,
                },
            };

            warn!(endpoint = %host, error = %error, "Endpoint probe failed, trying next");
            failures.push(EndpointFailure {
                endpoint: host.to_string(),
                error,
            });
        }

        Err(ChainError::AllEndpointsUnavailable(failures))
    }
}
