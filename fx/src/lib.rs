//! bitcoinprices FX Engine
//!
//! Exchange rate handling for the price widget.
//!
//! # Features
//!
//! - Rate table snapshots fetched from a JSON rate provider
//! - Conversion between the base unit and any fiat currency, with fiat to fiat
//!   cross conversion through the base unit
//! - Display formatting with per-currency precision and symbols
//!
//! # Example
//!
//! ```rust,ignore
//! use bitcoinprices_common::Currency;
//! use bitcoinprices_fx::{CurrencyConverter, HttpRateSource, RateSource, RateStore};
//!
//! let source = HttpRateSource::new("https://api.bitcoinaverage.com/ticker/all")?;
//! let store = RateStore::new();
//! store.replace(source.fetch().await?);
//!
//! let converter = CurrencyConverter::new(store.clone(), Currency::btc(), "24h_avg");
//! let usd = converter.convert(dec!(0.25), &Currency::btc(), &Currency::usd())?;
//! ```

pub mod converter;
pub mod error;
pub mod format;
pub mod provider;
pub mod rate_table;
pub mod store;

pub use converter::CurrencyConverter;
pub use error::{FxError, FxResult};
pub use format::PriceFormatter;
pub use provider::{HttpRateSource, RateSource};
pub use rate_table::{RateRecord, RateTable};
pub use store::{RateStore, SnapshotInfo};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::StaticRateSource;
