//! FX engine error types.

use bitcoinprices_common::Currency;
use thiserror::Error;

/// Errors that can occur while loading rates or converting amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FxError {
    /// No rate table has been loaded yet.
    #[error("Exchange rate data not available")]
    RateUnavailable,

    /// The loaded table has no record for the currency.
    #[error("No market data for currency: {0}")]
    UnknownCurrency(Currency),

    /// The configured rate field is missing, zero or not a number.
    #[error("Invalid rate field {field:?} for {currency}")]
    InvalidRate { currency: Currency, field: String },

    /// The converted amount does not fit the decimal range.
    #[error("Converting {amount} {currency} is out of range")]
    AmountOutOfRange { currency: Currency, amount: String },

    /// Source or target currency code was empty.
    #[error("Both source and target currency are required")]
    EmptyCurrencyCode,

    /// Fetching or decoding the rate table failed.
    #[error("Failed to load market data: {0}")]
    DataLoadFailed(String),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
