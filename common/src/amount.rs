//! Decimal amount helpers.
//!
//! Prices arrive as attribute strings and rates as JSON numbers; both are read
//! into [`Decimal`] through their shortest textual form so `0.5` stays `0.5`.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

use crate::error::AmountError;

/// Parse a textual amount. Accepts plain and scientific notation.
pub fn parse_amount(input: &str) -> Result<Decimal, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);

    // Digit separators are not part of the accepted syntax
    if trimmed.contains('_') {
        return Err(AmountError::NotANumber(input.to_string()));
    }

    if trimmed.contains(['e', 'E']) {
        return Decimal::from_scientific(trimmed)
            .map_err(|_| AmountError::NotANumber(input.to_string()));
    }

    Decimal::from_str(trimmed).map_err(|_| AmountError::NotANumber(input.to_string()))
}

/// Read a JSON number, or a string holding one, as a decimal.
pub fn decimal_from_json(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_amount(&n.to_string()).ok(),
        Value::String(s) => parse_amount(s).ok(),
        _ => None,
    }
}
