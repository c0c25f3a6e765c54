//! Transfer request body shared by all transfer routes

use serde::Deserialize;
use utoipa::ToSchema;

use super::money::LenientDecimal;
use crate::transfer::TransferRequest;

/// Body of every transfer route
///
/// Older clients name the destination `toAddress` or `treasury` and the ETH
/// amount `amountETH`; all spellings are accepted.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferBody {
    /// Destination address
    #[serde(alias = "toAddress", alias = "treasury")]
    #[schema(example = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045")]
    pub to: Option<String>,

    /// Amount in ETH
    #[serde(alias = "amountETH")]
    #[schema(value_type = Option<String>, example = "0.1")]
    pub amount: Option<LenientDecimal>,

    /// Amount in USD, converted at the published price
    #[serde(rename = "amountUSD")]
    #[schema(value_type = Option<String>, example = "350")]
    pub amount_usd: Option<LenientDecimal>,

    /// Share of the balance net of the fee reserve, in (0, 100]
    #[schema(value_type = Option<String>, example = "50")]
    pub percentage: Option<LenientDecimal>,
}

impl From<TransferBody> for TransferRequest {
    fn from(body: TransferBody) -> Self {
        TransferRequest {
            destination: body.to,
            amount_eth: body.amount.map(LenientDecimal::inner),
            amount_usd: body.amount_usd.map(LenientDecimal::inner),
            percentage: body.percentage.map(LenientDecimal::inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_aliases_normalize() {
        for json in [
            r#"{"to": "0xabc", "amount": 0.1}"#,
            r#"{"toAddress": "0xabc", "amountETH": "0.1"}"#,
            r#"{"treasury": "0xabc", "amount": "0.1"}"#,
        ] {
            let body: TransferBody = serde_json::from_str(json).unwrap();
            let req = TransferRequest::from(body);
            assert_eq!(req.destination.as_deref(), Some("0xabc"), "{json}");
            assert_eq!(req.amount_eth, Some(Decimal::new(1, 1)), "{json}");
        }
    }

    #[test]
    fn test_usd_and_percentage() {
        let body: TransferBody =
            serde_json::from_str(r#"{"to": "0xabc", "amountUSD": 350, "percentage": "25"}"#)
                .unwrap();
        let req = TransferRequest::from(body);
        assert_eq!(req.amount_usd, Some(Decimal::from(350)));
        assert_eq!(req.percentage, Some(Decimal::from(25)));
        assert_eq!(req.amount_eth, None);
    }

    #[test]
    fn test_empty_body_is_valid_json() {
        let body: TransferBody = serde_json::from_str("{}").unwrap();
        let req = TransferRequest::from(body);
        assert!(req.destination.is_none());
    }
}
