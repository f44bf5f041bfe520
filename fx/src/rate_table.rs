//! Exchange rate table snapshots.

use std::collections::HashMap;

use bitcoinprices_common::{decimal_from_json, Currency};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{FxError, FxResult};

/// Rate fields published for one currency, e.g. `24h_avg`, `bid`, `ask`, `last`.
///
/// Fields are kept as raw JSON; only the field a conversion asks for is
/// interpreted, so unrelated non-numeric fields never fail a load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateRecord {
    fields: Map<String, Value>,
}

impl RateRecord {
    /// Create a record from raw provider fields.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Raw value of a field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Units of fiat per one base unit, if the field holds a positive number.
    pub fn rate(&self, name: &str) -> Option<Decimal> {
        self.field(name)
            .and_then(decimal_from_json)
            .filter(|rate| rate.is_sign_positive() && !rate.is_zero())
    }

    /// Names of all fields in this record.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// The latest rate data, keyed by currency code.
///
/// Replaced wholesale on each fetch.
#[derive(Debug, Clone)]
pub struct RateTable {
    records: HashMap<Currency, RateRecord>,
    fetched_at: DateTime<Utc>,
    source: String,
}

impl RateTable {
    /// Build a table from the provider's JSON payload.
    ///
    /// Top-level entries that are not objects (such as a `timestamp` string)
    /// are skipped.
    pub fn from_value(value: Value, source: impl Into<String>) -> FxResult<Self> {
        let source = source.into();
        let Value::Object(entries) = value else {
            return Err(FxError::DataLoadFailed(format!(
                "expected a JSON object from {}",
                source
            )));
        };

        let mut records = HashMap::with_capacity(entries.len());
        for (code, entry) in entries {
            match entry {
                Value::Object(fields) => {
                    records.insert(Currency::new(code), RateRecord::new(fields));
                }
                other => {
                    debug!(key = %code, value = %other, "Skipping non-currency entry");
                }
            }
        }

        Ok(Self {
            records,
            fetched_at: Utc::now(),
            source,
        })
    }

    /// Parse a table from JSON text.
    pub fn from_json(text: &str, source: impl Into<String>) -> FxResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| FxError::DataLoadFailed(format!("malformed rate data: {}", e)))?;
        Self::from_value(value, source)
    }

    /// Look up the record for a currency.
    pub fn get(&self, currency: &Currency) -> Option<&RateRecord> {
        self.records.get(currency)
    }

    /// Currencies present in the table, sorted by code.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut currencies: Vec<Currency> = self.records.keys().cloned().collect();
        currencies.sort();
        currencies
    }

    /// When the table was fetched.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Where the table came from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
