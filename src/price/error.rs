use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PriceError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Price source returned HTTP {0}")]
    Status(u16),

    #[error("Price source timed out")]
    Timeout,

    #[error("No value at {0} in price response")]
    MissingField(String),

    #[error("Price value is not a number: {0}")]
    NotANumber(String),

    #[error("Price {price} outside plausible range ({min}, {max})")]
    OutOfBand {
        price: Decimal,
        min: Decimal,
        max: Decimal,
    },

    #[error("All {0} price sources failed")]
    AllSourcesFailed(usize),
}
