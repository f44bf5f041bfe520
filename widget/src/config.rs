//! Widget configuration.

use std::collections::HashMap;

use bitcoinprices_common::Currency;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WidgetError, WidgetResult};

/// Interaction toggles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UxConfig {
    /// Clicking a price selects the next currency.
    pub click_prices: bool,
    /// Populate the currency dropdown menu.
    pub menu: bool,
    /// Clicking a currency symbol placeholder selects the next currency.
    pub clickable_currency_symbol: bool,
}

impl Default for UxConfig {
    fn default() -> Self {
        Self {
            click_prices: true,
            menu: true,
            clickable_currency_symbol: false,
        }
    }
}

/// Widget configuration, as handed over by the host page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetConfig {
    /// Rate data URL. `None` runs headless: nothing is fetched.
    pub url: Option<String>,
    /// Rate field read from each currency's record.
    pub market_rate_variable: String,
    /// Selectable currencies, in cycling order.
    pub currencies: Vec<Currency>,
    /// Display symbols by currency.
    pub symbols: HashMap<Currency, String>,
    /// Currency shown before the visitor picks one.
    pub default_currency: Option<Currency>,
    /// Interaction toggles.
    pub ux: UxConfig,
    /// Attribute carrying the price in the original currency.
    pub price_attribute: String,
    /// Currency prices are authored in.
    pub price_original_currency: Currency,
    /// Elements that cycle the currency on click. Defaults to the priced elements.
    pub clickable_price_selector: Option<String>,
    /// Attribute marking a priced element that renders without symbol.
    pub no_symbol_attribute: String,
    /// Currency symbol placeholders.
    pub symbol_selector: String,
    /// Currency dropdown menu roots.
    pub menu_selector: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            url: None,
            market_rate_variable: "24h_avg".to_string(),
            currencies: vec![Currency::btc(), Currency::usd(), Currency::eur(), Currency::cny()],
            symbols: HashMap::new(),
            default_currency: Some(Currency::btc()),
            ux: UxConfig::default(),
            price_attribute: "data-btc-price".to_string(),
            price_original_currency: Currency::btc(),
            clickable_price_selector: None,
            no_symbol_attribute: "data-no-currency-symbol".to_string(),
            symbol_selector: ".currency-symbol".to_string(),
            menu_selector: ".currency-dropdown".to_string(),
        }
    }
}

impl WidgetConfig {
    /// Parse and validate configuration from JSON text.
    pub fn from_json(text: &str) -> WidgetResult<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| WidgetError::ConfigInvalid(format!("malformed configuration: {}", e)))?;
        Self::from_value(value)
    }

    /// Build and validate configuration from a JSON value.
    pub fn from_value(value: Value) -> WidgetResult<Self> {
        if value.is_null() {
            return Err(WidgetError::ConfigInvalid(
                "no configuration supplied".to_string(),
            ));
        }

        let config: Self = serde_json::from_value(value)
            .map_err(|e| WidgetError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("BITCOINPRICES_URL") {
            if !url.is_empty() {
                config.url = Some(url);
            }
        }

        if let Ok(currency) = std::env::var("BITCOINPRICES_DEFAULT_CURRENCY") {
            config.default_currency = Some(Currency::new(currency));
        }

        if let Ok(list) = std::env::var("BITCOINPRICES_CURRENCIES") {
            config.currencies = list
                .split(',')
                .map(Currency::new)
                .filter(|c| !c.is_empty())
                .collect();
        }

        if let Ok(field) = std::env::var("BITCOINPRICES_RATE_FIELD") {
            config.market_rate_variable = field;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> WidgetResult<()> {
        if self.currencies.is_empty() {
            return Err(WidgetError::ConfigInvalid(
                "currencies cannot be empty".to_string(),
            ));
        }

        if self.currencies.iter().any(Currency::is_empty) {
            return Err(WidgetError::ConfigInvalid(
                "currencies cannot contain an empty code".to_string(),
            ));
        }

        if self.market_rate_variable.is_empty() {
            return Err(WidgetError::ConfigInvalid(
                "marketRateVariable cannot be empty".to_string(),
            ));
        }

        if self.price_attribute.is_empty() {
            return Err(WidgetError::ConfigInvalid(
                "priceAttribute cannot be empty".to_string(),
            ));
        }

        if self.price_original_currency.is_empty() {
            return Err(WidgetError::ConfigInvalid(
                "priceOriginalCurrency cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Selector matching priced elements.
    pub fn price_selector(&self) -> String {
        format!("[{}]", self.price_attribute)
    }

    /// Selector matching elements that cycle the currency on click.
    pub fn click_selector(&self) -> String {
        self.clickable_price_selector
            .clone()
            .unwrap_or_else(|| self.price_selector())
    }
}
