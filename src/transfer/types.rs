use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error::TransferError;

/// Outbound transfer as the pipeline sees it
///
/// Field-name aliases and string/number leniency are handled by the HTTP
/// layer before this is built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferRequest {
    pub destination: Option<String>,
    pub amount_eth: Option<Decimal>,
    pub amount_usd: Option<Decimal>,
    pub percentage: Option<Decimal>,
}

/// How the amount is expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountSpec {
    Eth(Decimal),
    Usd(Decimal),
    /// Share of the live balance net of the fee reserve
    Percentage(Decimal),
}

impl AmountSpec {
    pub fn depends_on_balance(&self) -> bool {
        matches!(self, AmountSpec::Percentage(_))
    }
}

impl TransferRequest {
    /// Percentage wins over an ETH amount, which wins over a USD amount
    pub fn amount_spec(&self) -> Result<AmountSpec, TransferError> {
        if let Some(pct) = self.percentage {
            if pct <= Decimal::ZERO || pct > Decimal::ONE_HUNDRED {
                return Err(TransferError::InvalidAmount(format!(
                    "percentage must be in (0, 100], got {}",
                    pct
                )));
            }
            return Ok(AmountSpec::Percentage(pct));
        }
        match (self.amount_eth, self.amount_usd) {
            (Some(eth), _) => Ok(AmountSpec::Eth(eth)),
            (None, Some(usd)) => Ok(AmountSpec::Usd(usd)),
            (None, None) => Err(TransferError::InvalidAmount(
                "one of amount, amountUSD or percentage is required".into(),
            )),
        }
    }
}

/// Successful, confirmed transfer
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TransferReceipt {
    pub id: u64,
    pub request_id: Uuid,
    pub tx_hash: String,
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[schema(value_type = String)]
    pub amount_usd: Decimal,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub to: String,
    #[schema(value_type = String)]
    pub fee_paid: Decimal,
    pub block_number: u64,
    pub confirmed: bool,
}
