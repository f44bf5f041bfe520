//! Display formatting for prices.

use std::collections::HashMap;

use bitcoinprices_common::Currency;
use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places shown for the base unit.
pub const BASE_DECIMAL_PLACES: u32 = 8;

/// Decimal places shown for fiat currencies.
pub const FIAT_DECIMAL_PLACES: u32 = 2;

/// Renders amounts with currency-dependent precision and optional symbols.
#[derive(Debug, Clone)]
pub struct PriceFormatter {
    base: Currency,
    symbols: HashMap<Currency, String>,
}

impl PriceFormatter {
    /// Create a formatter. Currencies without a symbol display their code.
    pub fn new(base: Currency, symbols: HashMap<Currency, String>) -> Self {
        Self { base, symbols }
    }

    /// Decimal places used for `currency`.
    pub fn decimal_places(&self, currency: &Currency) -> u32 {
        if *currency == self.base {
            BASE_DECIMAL_PLACES
        } else {
            FIAT_DECIMAL_PLACES
        }
    }

    /// Format `amount`, rounded half away from zero, with a fixed number of
    /// decimals. With `include_symbol` a space and the symbol are appended.
    pub fn format(&self, amount: Decimal, currency: &Currency, include_symbol: bool) -> String {
        let places = self.decimal_places(currency);
        let rounded = amount.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        let number = format!("{:.*}", places as usize, rounded);

        if include_symbol {
            format!("{} {}", number, self.symbol_for(currency))
        } else {
            number
        }
    }

    /// Configured symbol for `currency`, or its code.
    pub fn symbol_for<'a>(&'a self, currency: &'a Currency) -> &'a str {
        self.symbols
            .get(currency)
            .map(String::as_str)
            .unwrap_or_else(|| currency.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn formatter() -> PriceFormatter {
        let mut symbols = HashMap::new();
        symbols.insert(Currency::btc(), "฿".to_string());
        symbols.insert(Currency::usd(), "$".to_string());
        PriceFormatter::new(Currency::btc(), symbols)
    }

    #[test]
    fn test_base_precision() {
        let f = formatter();
        assert_eq!(f.format(dec!(1.23456789), &Currency::btc(), true), "1.23456789 ฿");
        assert_eq!(f.format(dec!(0.5), &Currency::btc(), false), "0.50000000");
        assert_eq!(f.format(dec!(1.234567895), &Currency::btc(), false), "1.23456790");
    }

    #[test]
    fn test_fiat_precision() {
        let f = formatter();
        assert_eq!(f.format(dec!(1.236), &Currency::usd(), true), "1.24 $");
        assert_eq!(f.format(dec!(2), &Currency::usd(), false), "2.00");
        assert_eq!(f.format(dec!(1234.5), &Currency::eur(), false), "1234.50");
    }

    #[test]
    fn test_half_away_from_zero() {
        let f = formatter();
        assert_eq!(f.format(dec!(0.125), &Currency::usd(), false), "0.13");
        assert_eq!(f.format(dec!(-0.125), &Currency::usd(), false), "-0.13");
        assert_eq!(f.format(dec!(0.135), &Currency::usd(), false), "0.14");
    }

    #[test]
    fn test_symbol_fallback_to_code() {
        let f = formatter();
        assert_eq!(f.symbol_for(&Currency::usd()), "$");
        assert_eq!(f.symbol_for(&Currency::cny()), "CNY");
        assert_eq!(f.format(dec!(8), &Currency::cny(), true), "8.00 CNY");
    }

    #[test]
    fn test_configured_base_changes_precision() {
        let f = PriceFormatter::new(Currency::usd(), HashMap::new());
        assert_eq!(f.decimal_places(&Currency::usd()), 8);
        assert_eq!(f.decimal_places(&Currency::btc()), 2);
    }
}
