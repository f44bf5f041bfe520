//! Widget error types.

use bitcoinprices_fx::FxError;
use thiserror::Error;

/// Errors surfaced by the widget.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    /// Configuration missing or unusable.
    #[error("Configuration error: {0}")]
    ConfigInvalid(String),

    /// A priced element's attribute is not a number.
    #[error("Malformed price attribute {attribute}={value:?}")]
    MalformedPriceAttribute { attribute: String, value: String },

    /// Data load requested without a configured source.
    #[error("No rate source configured")]
    NoRateSource,

    /// Rate loading or conversion failed.
    #[error(transparent)]
    Fx(#[from] FxError),
}

impl WidgetError {
    /// Get a stable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            WidgetError::ConfigInvalid(_) => "CONFIG_INVALID",
            WidgetError::MalformedPriceAttribute { .. } => "MALFORMED_PRICE_ATTRIBUTE",
            WidgetError::NoRateSource => "NO_RATE_SOURCE",
            WidgetError::Fx(FxError::RateUnavailable) => "RATE_UNAVAILABLE",
            WidgetError::Fx(FxError::UnknownCurrency(_)) => "UNKNOWN_CURRENCY",
            WidgetError::Fx(FxError::InvalidRate { .. }) => "INVALID_RATE",
            WidgetError::Fx(FxError::AmountOutOfRange { .. }) => "AMOUNT_OUT_OF_RANGE",
            WidgetError::Fx(FxError::EmptyCurrencyCode) => "EMPTY_CURRENCY_CODE",
            WidgetError::Fx(FxError::DataLoadFailed(_)) => "DATA_LOAD_FAILED",
        }
    }
}

/// Result type alias for widget operations.
pub type WidgetResult<T> = Result<T, WidgetError>;
