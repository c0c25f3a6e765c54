//! Money types at the API boundary

use rust_decimal::prelude::*;
use serde::Deserialize;

// ============================================================================
// LenientDecimal: JSON number or numeric string
// ============================================================================

/// Amount accepted either as a JSON number or as a numeric string
///
/// Existing callers send both `"amount": 0.1` and `"amount": "0.1"`.
/// Format checks still apply to strings:
/// - Rejects empty strings
/// - Rejects scientific notation
/// - Rejects `+` prefix
///
/// Sign and range are business rules checked by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LenientDecimal(Decimal);

impl LenientDecimal {
    pub fn inner(self) -> Decimal {
        self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(serde_json::Number),
    Text(String),
}

fn parse_text(s: &str) -> Result<Decimal, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Amount cannot be empty".into());
    }
    if s.contains('e') || s.contains('E') {
        return Err("Invalid format: scientific notation not allowed".into());
    }
    if s.starts_with('+') {
        return Err("Invalid format: + prefix not allowed".into());
    }
    Decimal::from_str(s).map_err(|e| format!("Invalid decimal: {}", e))
}

impl<'de> Deserialize<'de> for LenientDecimal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let d = match RawAmount::deserialize(deserializer)? {
            RawAmount::Text(s) => parse_text(&s),
            // Numbers come from f64 shortest formatting, exponents included
            RawAmount::Number(n) => {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .map_err(|e| format!("Invalid number: {}", e))
            }
        }
        .map_err(D::Error::custom)?;

        Ok(LenientDecimal(d))
    }
}
