//! Conversion between the base unit and fiat currencies.

use bitcoinprices_common::Currency;
use rust_decimal::Decimal;
use tracing::trace;

use crate::error::{FxError, FxResult};
use crate::store::RateStore;

/// Converts amounts using the rates in a [`RateStore`].
///
/// Rates are "units of fiat per one base unit". Fiat to fiat goes through the
/// base unit; there is no direct cross-rate table. Nothing is cached, every
/// call reads the current snapshot.
#[derive(Debug, Clone)]
pub struct CurrencyConverter {
    store: RateStore,
    base: Currency,
    rate_field: String,
}

impl CurrencyConverter {
    /// Create a converter reading `rate_field` from each currency's record.
    pub fn new(store: RateStore, base: Currency, rate_field: impl Into<String>) -> Self {
        Self {
            store,
            base,
            rate_field: rate_field.into(),
        }
    }

    /// The base currency.
    pub fn base(&self) -> &Currency {
        &self.base
    }

    /// The rate field used for conversions.
    pub fn rate_field(&self) -> &str {
        &self.rate_field
    }

    /// Convert `amount` from `source` to `target`.
    pub fn convert(&self, amount: Decimal, source: &Currency, target: &Currency) -> FxResult<Decimal> {
        if source.is_empty() || target.is_empty() {
            return Err(FxError::EmptyCurrencyCode);
        }

        if source == target {
            return Ok(amount);
        }

        if *source != self.base && *target != self.base {
            let in_base = self.convert(amount, source, &self.base)?;
            return self.convert(in_base, &self.base, target);
        }

        let (fiat, base_to_fiat) = if *source == self.base {
            (target, true)
        } else {
            (source, false)
        };

        let rate = self.rate(fiat)?;
        let converted = if base_to_fiat {
            amount.checked_mul(rate)
        } else {
            amount.checked_div(rate)
        };

        trace!(
            source = %source,
            target = %target,
            amount = %amount,
            rate = %rate,
            "Converted amount"
        );

        converted.ok_or_else(|| FxError::AmountOutOfRange {
            currency: source.clone(),
            amount: amount.to_string(),
        })
    }

    /// Rate of `currency` against the base unit.
    pub fn rate(&self, currency: &Currency) -> FxResult<Decimal> {
        let table = self.store.snapshot().ok_or(FxError::RateUnavailable)?;
        let record = table
            .get(currency)
            .ok_or_else(|| FxError::UnknownCurrency(currency.clone()))?;

        record
            .rate(&self.rate_field)
            .ok_or_else(|| FxError::InvalidRate {
                currency: currency.clone(),
                field: self.rate_field.clone(),
            })
    }
}
