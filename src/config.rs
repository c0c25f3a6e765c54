use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

use crate::chain::address::is_valid_address;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    /// Crates capped at `warn` regardless of `log_level`
    #[serde(default = "default_quiet_targets")]
    pub quiet_targets: Vec<String>,
    pub gateway: GatewayConfig,
    pub custody: CustodyConfig,
    pub chain: ChainConfig,
    pub price: PriceConfig,
    pub balance: BalanceConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// The custodial account and the safety margins applied to it
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustodyConfig {
    /// Address of the custodial account (overridden by `CUSTODY_ADDRESS`)
    pub address: String,
    /// Below this live balance `/status` reports `can_transfer = false`
    #[serde(default = "default_min_operating_balance")]
    pub min_operating_balance: Decimal,
    /// Held back from the balance before applying a percentage
    #[serde(default = "default_fee_reserve")]
    pub fee_reserve: Decimal,
    /// Subtracted on top of the fee when reporting the max withdrawable amount
    #[serde(default = "default_withdraw_buffer")]
    pub withdraw_buffer: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChainConfig {
    /// Network label reported by balance endpoints
    #[serde(default = "default_network")]
    pub network: String,
    /// JSON-RPC endpoints in priority order (overridden by `RPC_ENDPOINTS`)
    pub rpc_endpoints: Vec<String>,
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub fees: FeeConfig,
}

/// Remote signer holding the custodial key
///
/// When `url` is absent transactions go to the node via `eth_sendTransaction`
/// (dev nodes with an unlocked account).
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SignerConfig {
    pub url: Option<String>,
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FeeConfig {
    /// Gas units of a plain value transfer
    pub gas_limit: u64,
    /// Applied to `gas_price * gas_limit` for the pre-submission estimate
    pub estimate_multiplier: u64,
    /// Applied to `gas_price` for `maxFeePerGas`
    pub max_fee_multiplier: u64,
    pub priority_fee_gwei: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            gas_limit: 21_000,
            estimate_multiplier: 2,
            max_fee_multiplier: 2,
            priority_fee_gwei: 2,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PriceConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_price_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Published until the first accepted quote
    pub default_price: Decimal,
    pub min_plausible: Decimal,
    pub max_plausible: Decimal,
    pub sources: Vec<PriceSourceConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PriceSourceConfig {
    pub name: String,
    pub url: String,
    /// JSON pointer to the price inside the response body, e.g. `/data/amount`
    pub pointer: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BalanceConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,
    pub explorer: Option<ExplorerConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExplorerConfig {
    pub url: String,
    /// Overridden by `EXPLORER_API_KEY`
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_price_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_quiet_targets() -> Vec<String> {
    vec!["hyper".to_string(), "reqwest".to_string()]
}

fn default_min_operating_balance() -> Decimal {
    Decimal::new(1, 2)
}

fn default_fee_reserve() -> Decimal {
    Decimal::new(3, 3)
}

fn default_withdraw_buffer() -> Decimal {
    Decimal::new(5, 4)
}

fn default_network() -> String {
    "Mainnet".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    3_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_confirmation_timeout_secs() -> u64 {
    300
}

fn default_receipt_poll_interval_ms() -> u64 {
    2_000
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_price_timeout_ms() -> u64 {
    5_000
}

fn default_initial_delay_secs() -> u64 {
    2
}

impl AppConfig {
    /// Load `config/{env}.yaml`, apply environment overrides and validate
    pub fn load(env: &str) -> Result<Self, ConfigError> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
            path: config_path.clone(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Secrets and deployment-specific values never live in the YAML files
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup("CUSTODY_ADDRESS") {
            self.custody.address = address;
        }
        if let Some(endpoints) = lookup("RPC_ENDPOINTS") {
            self.chain.rpc_endpoints = endpoints
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(url) = lookup("SIGNER_URL") {
            self.chain.signer.url = Some(url);
        }
        if let Some(token) = lookup("SIGNER_AUTH_TOKEN") {
            self.chain.signer.auth_token = Some(token);
        }
        if let Some(key) = lookup("EXPLORER_API_KEY")
            && let Some(explorer) = self.balance.explorer.as_mut()
        {
            explorer.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.rpc_endpoints.is_empty() {
            return Err(ConfigError::Invalid(
                "chain.rpc_endpoints must list at least one endpoint".into(),
            ));
        }
        if !is_valid_address(&self.custody.address) {
            return Err(ConfigError::Invalid(format!(
                "custody.address is not a valid account address: {}",
                self.custody.address
            )));
        }
        if self.price.sources.is_empty() {
            return Err(ConfigError::Invalid(
                "price.sources must list at least one source".into(),
            ));
        }
        let price = &self.price;
        if price.min_plausible <= Decimal::ZERO || price.min_plausible >= price.max_plausible {
            return Err(ConfigError::Invalid(format!(
                "price sanity band is empty: ({}, {})",
                price.min_plausible, price.max_plausible
            )));
        }
        if price.default_price <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "price.default_price must be positive".into(),
            ));
        }
        if self.custody.fee_reserve < Decimal::ZERO || self.custody.withdraw_buffer < Decimal::ZERO
        {
            return Err(ConfigError::Invalid(
                "custody margins must not be negative".into(),
            ));
        }

        let fees = &self.chain.fees;
        if fees.gas_limit == 0 {
            return Err(ConfigError::Invalid("chain.fees.gas_limit must be positive".into()));
        }
        if fees.estimate_multiplier < 1 || fees.max_fee_multiplier < 1 {
            return Err(ConfigError::Invalid(format!(
                "fee multipliers must be at least 1 (estimate {}, max fee {})",
                fees.estimate_multiplier, fees.max_fee_multiplier
            )));
        }

        // Zero periods panic in the interval timers or spin the receipt loop
        let periods = [
            ("chain.probe_timeout_ms", self.chain.probe_timeout_ms),
            ("chain.request_timeout_ms", self.chain.request_timeout_ms),
            ("chain.confirmation_timeout_secs", self.chain.confirmation_timeout_secs),
            ("chain.receipt_poll_interval_ms", self.chain.receipt_poll_interval_ms),
            ("price.poll_interval_secs", self.price.poll_interval_secs),
            ("price.request_timeout_ms", self.price.request_timeout_ms),
            ("balance.poll_interval_secs", self.balance.poll_interval_secs),
        ];
        if let Some((name, _)) = periods.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{} must be positive", name)));
        }
        Ok(())
    }
}

impl ChainConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
log_level: "info"
log_dir: "./logs"
log_file: "custody.log"
use_json: false
rotation: "daily"
gateway:
  host: "0.0.0.0"
  port: 3000
custody:
  address: "0x86bB004AF573623752401F14D9847917745556bc"
chain:
  rpc_endpoints:
    - "https://ethereum.publicnode.com"
    - "https://eth.drpc.org"
price:
  default_price: 3500
  min_plausible: 100
  max_plausible: 100000
  sources:
    - name: "Binance"
      url: "https://api.binance.com/api/v3/ticker/price?symbol=ETHUSDT"
      pointer: "/price"
balance:
  explorer:
    url: "https://api.etherscan.io/api"
"#;

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();

        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.quiet_targets, vec!["hyper", "reqwest"]);
        assert_eq!(config.chain.rpc_endpoints.len(), 2);
        assert_eq!(config.chain.fees.gas_limit, 21_000);
        assert_eq!(config.chain.fees.estimate_multiplier, 2);
        assert_eq!(config.custody.fee_reserve, Decimal::new(3, 3));
        assert_eq!(config.custody.withdraw_buffer, Decimal::new(5, 4));
        assert_eq!(config.price.poll_interval_secs, 30);
        assert_eq!(config.price.request_timeout_ms, 5_000);
        assert_eq!(config.balance.initial_delay_secs, 2);
        assert!(config.chain.signer.url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::from_yaml(SAMPLE).unwrap();
        let env: HashMap<&str, &str> = [
            ("RPC_ENDPOINTS", "http://a:8545, http://b:8545,"),
            ("SIGNER_URL", "http://signer:8550"),
            ("EXPLORER_API_KEY", "secret"),
        ]
        .into_iter()
        .collect();

        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(
            config.chain.rpc_endpoints,
            vec!["http://a:8545".to_string(), "http://b:8545".to_string()]
        );
        assert_eq!(config.chain.signer.url.as_deref(), Some("http://signer:8550"));
        assert_eq!(
            config.balance.explorer.unwrap().api_key.as_deref(),
            Some("secret")
        );
    }

    #[test]
    fn test_validate_rejects_bad_custody_address() {
        let mut config = AppConfig::from_yaml(SAMPLE).unwrap();
        config.custody.address = "0x1234".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_fee_settings() {
        let mut config = AppConfig::from_yaml(SAMPLE).unwrap();
        config.chain.fees.estimate_multiplier = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::from_yaml(SAMPLE).unwrap();
        config.chain.fees.max_fee_multiplier = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::from_yaml(SAMPLE).unwrap();
        config.chain.fees.gas_limit = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_periods() {
        let zeroes: [fn(&mut AppConfig); 4] = [
            |c| c.price.poll_interval_secs = 0,
            |c| c.balance.poll_interval_secs = 0,
            |c| c.chain.receipt_poll_interval_ms = 0,
            |c| c.chain.probe_timeout_ms = 0,
        ];
        for zero in zeroes {
            let mut config = AppConfig::from_yaml(SAMPLE).unwrap();
            zero(&mut config);
            match config.validate() {
                Err(ConfigError::Invalid(msg)) => assert!(msg.contains("must be positive"), "{}", msg),
                other => panic!("expected rejection, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_validate_rejects_empty_sanity_band() {
        let mut config = AppConfig::from_yaml(SAMPLE).unwrap();
        config.price.min_plausible = Decimal::from(5000);
        config.price.max_plausible = Decimal::from(100);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
