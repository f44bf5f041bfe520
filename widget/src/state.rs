//! The visitor's selected display currency.

use std::sync::Arc;

use bitcoinprices_common::Currency;
use tracing::debug;

use crate::storage::{KeyValueStore, ACTIVE_CURRENCY_KEY};

/// Tracks the active currency, persisted in a [`KeyValueStore`].
#[derive(Clone)]
pub struct ActiveCurrencyState {
    store: Arc<dyn KeyValueStore>,
    currencies: Vec<Currency>,
    default_currency: Option<Currency>,
    base: Currency,
}

impl ActiveCurrencyState {
    /// Create the state over an ordered list of selectable currencies.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        currencies: Vec<Currency>,
        default_currency: Option<Currency>,
        base: Currency,
    ) -> Self {
        Self {
            store,
            currencies,
            default_currency,
            base,
        }
    }

    /// Selectable currencies, in cycling order.
    pub fn currencies(&self) -> &[Currency] {
        &self.currencies
    }

    /// Stored preference, else the default currency, else the base currency.
    pub fn get(&self) -> Currency {
        self.stored()
            .or_else(|| self.default_currency.clone().filter(|c| !c.is_empty()))
            .unwrap_or_else(|| self.base.clone())
    }

    /// Persist `currency` as the preference.
    pub fn set(&self, currency: &Currency) {
        debug!(currency = %currency, "Active currency set");
        self.store.set(ACTIVE_CURRENCY_KEY, currency.code());
    }

    /// Whether `currency` is one of the selectable currencies.
    pub fn is_selectable(&self, currency: &Currency) -> bool {
        self.currencies.contains(currency)
    }

    /// Overwrite the preference with the base currency when it is not
    /// selectable.
    pub fn reset(&self) {
        let current = self.get();
        if !self.is_selectable(&current) {
            debug!(currency = %current, base = %self.base, "Resetting unknown active currency");
            self.set(&self.base);
        }
    }

    /// Select and persist the next currency in the list, wrapping after the
    /// last. An unknown current currency selects the first entry.
    pub fn advance(&self) -> Currency {
        if self.currencies.is_empty() {
            return self.get();
        }

        let current = self.get();
        let next = match self.currencies.iter().position(|c| *c == current) {
            Some(idx) => (idx + 1) % self.currencies.len(),
            None => 0,
        };

        let currency = self.currencies[next].clone();
        self.set(&currency);
        currency
    }

    fn stored(&self) -> Option<Currency> {
        self.store
            .get(ACTIVE_CURRENCY_KEY)
            .map(Currency::new)
            .filter(|c| !c.is_empty())
    }
}

impl std::fmt::Debug for ActiveCurrencyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveCurrencyState")
            .field("active", &self.get())
            .field("currencies", &self.currencies)
            .finish()
    }
}
