//! Money Conversion Module
//!
//! Conversion between on-chain integer quantities (wei, hex-encoded in
//! JSON-RPC) and the `Decimal` ETH/USD amounts the service reasons in.
//! All conversions go through this module.
//!
//! ## Representation
//! - On chain: `u128` wei, `10^18` wei per ETH
//! - In the service: `Decimal` ETH, at most 18 fractional digits
//! - Fiat: `Decimal` USD, displayed at 2 fractional digits
//!
//! ## Usage
//! ```rust
//! use custody_gateway::money::{eth_to_wei, wei_to_eth};
//! use rust_decimal::Decimal;
//!
//! let wei = eth_to_wei(Decimal::new(15, 1)).unwrap();
//! assert_eq!(wei, 1_500_000_000_000_000_000);
//! assert_eq!(wei_to_eth(wei).unwrap(), Decimal::new(15, 1));
//! ```

use rust_decimal::prelude::*;
use thiserror::Error;

/// Fractional digits of the base asset
pub const ETH_DECIMALS: u32 = 18;

/// Fractional digits of fiat values in responses
pub const USD_DECIMALS: u32 = 2;

const WEI_PER_GWEI: u128 = 1_000_000_000;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum MoneyError {
    #[error("Amount must not be negative")]
    Negative,

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Invalid hex quantity: {0}")]
    InvalidHex(String),
}

// ============================================================================
// Wei <-> ETH
// ============================================================================

/// Exact wei → ETH conversion
pub fn wei_to_eth(wei: u128) -> Result<Decimal, MoneyError> {
    let wei = i128::try_from(wei).map_err(|_| MoneyError::Overflow)?;
    Decimal::try_from_i128_with_scale(wei, ETH_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|_| MoneyError::Overflow)
}

/// ETH → wei, truncating anything finer than one wei
pub fn eth_to_wei(eth: Decimal) -> Result<u128, MoneyError> {
    if eth.is_sign_negative() && !eth.is_zero() {
        return Err(MoneyError::Negative);
    }

    let eth = truncate_eth(eth);
    let pad = 10i128
        .checked_pow(ETH_DECIMALS - eth.scale())
        .ok_or(MoneyError::Overflow)?;
    let wei = eth.mantissa().checked_mul(pad).ok_or(MoneyError::Overflow)?;

    u128::try_from(wei).map_err(|_| MoneyError::Overflow)
}

/// Drop digits below one wei
pub fn truncate_eth(eth: Decimal) -> Decimal {
    eth.round_dp_with_strategy(ETH_DECIMALS, RoundingStrategy::ToZero)
}

pub fn gwei_to_wei(gwei: u64) -> u128 {
    gwei as u128 * WEI_PER_GWEI
}

/// Fiat value of an ETH amount, rounded to cents
pub fn eth_to_usd(eth: Decimal, price: Decimal) -> Decimal {
    eth.checked_mul(price)
        .map(|v| v.round_dp(USD_DECIMALS))
        .unwrap_or(Decimal::MAX)
}

// ============================================================================
// JSON-RPC hex quantities
// ============================================================================

pub fn parse_hex_u128(value: &str) -> Result<u128, MoneyError> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| MoneyError::InvalidHex(value.to_string()))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).map_err(|_| MoneyError::InvalidHex(value.to_string()))
}

pub fn parse_hex_u64(value: &str) -> Result<u64, MoneyError> {
    let v = parse_hex_u128(value)?;
    u64::try_from(v).map_err(|_| MoneyError::Overflow)
}

pub fn to_hex_quantity(value: u128) -> String {
    format!("0x{:x}", value)
}

// ============================================================================
// Tests
// ============================================================================
