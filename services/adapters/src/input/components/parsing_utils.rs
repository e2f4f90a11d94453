//! Parsing utilities for exchange payloads
//!
//! Binance encodes prices as JSON strings. Everything passing through here is
//! checked to be finite and non-negative before it can reach a candle series.

use serde_json::Value;

use crate::{AdapterError, Result};

/// Parse a price that may be a JSON string or number
pub fn parse_price(value: Option<&Value>, field: &str) -> Result<f64> {
    let value = value.ok_or_else(|| AdapterError::MissingField {
        field: field.to_string(),
    })?;

    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };

    match parsed {
        Some(price) if types::is_valid_price(price) => Ok(price),
        _ => Err(AdapterError::InvalidNumeric {
            value: value.to_string(),
        }),
    }
}

/// Parse a price from a string field of a typed message
pub fn parse_price_str(raw: &str) -> Result<f64> {
    match raw.trim().parse::<f64>() {
        Ok(price) if types::is_valid_price(price) => Ok(price),
        _ => Err(AdapterError::InvalidNumeric {
            value: raw.to_string(),
        }),
    }
}

/// Parse an integer millisecond timestamp
pub fn parse_millis(value: Option<&Value>, field: &str) -> Result<i64> {
    value
        .and_then(Value::as_i64)
        .ok_or_else(|| AdapterError::MissingField {
            field: field.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_price_accepts_string_and_number() {
        assert_eq!(parse_price(Some(&json!("0.4521")), "c").unwrap(), 0.4521);
        assert_eq!(parse_price(Some(&json!(42.5)), "c").unwrap(), 42.5);
    }

    #[test]
    fn test_parse_price_rejects_garbage() {
        assert!(parse_price(Some(&json!("abc")), "c").is_err());
        assert!(parse_price(Some(&json!("-1.0")), "c").is_err());
        assert!(parse_price(Some(&json!("NaN")), "c").is_err());
        assert!(parse_price(Some(&json!("inf")), "c").is_err());
        assert!(matches!(
            parse_price(None, "c"),
            Err(AdapterError::MissingField { .. })
        ));
    }
}
