//! The widget facade offered to the host page.

use std::sync::Arc;

use bitcoinprices_common::Currency;
use bitcoinprices_fx::{
    CurrencyConverter, HttpRateSource, PriceFormatter, RateSource, RateStore,
};
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::binder::{PageBinder, RenderReport};
use crate::config::WidgetConfig;
use crate::dom::Dom;
use crate::error::{WidgetError, WidgetResult};
use crate::events::{EventBus, WidgetEvent};
use crate::state::ActiveCurrencyState;
use crate::storage::KeyValueStore;

/// A bitcoin price widget bound to one document.
///
/// Owns its rate table and configuration; several widgets can serve one page.
pub struct BitcoinPrices {
    config: Arc<WidgetConfig>,
    rates: RateStore,
    converter: CurrencyConverter,
    formatter: PriceFormatter,
    state: ActiveCurrencyState,
    binder: PageBinder,
    events: EventBus,
    source: Option<Arc<dyn RateSource>>,
}

impl BitcoinPrices {
    /// Create the widget. When `config.url` is set rates come from that URL;
    /// otherwise the widget is headless and only the manual API is usable.
    pub fn init(
        config: WidgetConfig,
        dom: Arc<dyn Dom>,
        store: Arc<dyn KeyValueStore>,
    ) -> WidgetResult<Self> {
        let source = match &config.url {
            Some(url) => Some(Arc::new(HttpRateSource::new(url.clone())?) as Arc<dyn RateSource>),
            None => None,
        };
        Self::build(config, dom, store, source)
    }

    /// Create the widget with a custom rate source.
    pub fn init_with_source(
        config: WidgetConfig,
        dom: Arc<dyn Dom>,
        store: Arc<dyn KeyValueStore>,
        source: Arc<dyn RateSource>,
    ) -> WidgetResult<Self> {
        Self::build(config, dom, store, Some(source))
    }

    /// Create the widget and, unless headless, load rate data.
    pub async fn start(
        config: WidgetConfig,
        dom: Arc<dyn Dom>,
        store: Arc<dyn KeyValueStore>,
    ) -> WidgetResult<Self> {
        let widget = Self::init(config, dom, store)?;
        if widget.source.is_some() {
            widget.load_data().await?;
        }
        Ok(widget)
    }

    fn build(
        config: WidgetConfig,
        dom: Arc<dyn Dom>,
        store: Arc<dyn KeyValueStore>,
        source: Option<Arc<dyn RateSource>>,
    ) -> WidgetResult<Self> {
        config.validate()?;
        let config = Arc::new(config);

        let base = config.price_original_currency.clone();
        let rates = RateStore::new();
        let converter = CurrencyConverter::new(
            rates.clone(),
            base.clone(),
            config.market_rate_variable.clone(),
        );
        let formatter = PriceFormatter::new(base.clone(), config.symbols.clone());
        let state = ActiveCurrencyState::new(
            store,
            config.currencies.clone(),
            config.default_currency.clone(),
            base,
        );

        let events = EventBus::new();
        let binder = PageBinder::new(
            dom.clone(),
            config.clone(),
            converter.clone(),
            formatter.clone(),
            state.clone(),
            events.downgrade(),
        );

        events.subscribe(move |event| dom.trigger(event.name()));

        let on_data = binder.clone();
        events.subscribe(move |event| {
            if let WidgetEvent::MarketDataAvailable = event {
                on_data.on_data_available();
            }
        });

        Ok(Self {
            config,
            rates,
            converter,
            formatter,
            state,
            binder,
            events,
            source,
        })
    }

    /// Fetch rate data, replace the rate table and announce it.
    ///
    /// A failed fetch is announced as [`WidgetEvent::DataLoadFailed`] and
    /// returned; the previous table, if any, is left in place but never
    /// retried automatically.
    #[instrument(skip(self))]
    pub async fn load_data(&self) -> WidgetResult<()> {
        let source = self.source.as_ref().ok_or(WidgetError::NoRateSource)?;

        match source.fetch().await {
            Ok(table) => {
                info!(
                    source = source.name(),
                    currencies = table.len(),
                    "Market data loaded"
                );
                self.rates.replace(table);
                self.events.emit(WidgetEvent::MarketDataAvailable);
                Ok(())
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "Market data load failed");
                self.events.emit(WidgetEvent::DataLoadFailed(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Convert between currencies using the loaded rates.
    pub fn convert(
        &self,
        amount: Decimal,
        source: &Currency,
        target: &Currency,
    ) -> WidgetResult<Decimal> {
        Ok(self.converter.convert(amount, source, target)?)
    }

    /// Format an amount for display.
    pub fn format_price(&self, amount: Decimal, currency: &Currency, with_symbol: bool) -> String {
        self.formatter.format(amount, currency, with_symbol)
    }

    /// Display symbol for a currency.
    pub fn currency_symbol<'a>(&'a self, currency: &'a Currency) -> &'a str {
        self.formatter.symbol_for(currency)
    }

    /// The currency prices are shown in.
    pub fn get_active_currency(&self) -> Currency {
        self.state.get()
    }

    /// Select the next configured currency and announce the change.
    pub fn toggle_next_active_currency(&self) -> Currency {
        let currency = self.state.advance();
        self.events
            .emit(WidgetEvent::ActiveCurrencyChange(currency.clone()));
        currency
    }

    /// Fall back to the base currency if the stored choice is not configured.
    pub fn reset_currency(&self) {
        self.state.reset();
    }

    /// Re-render every priced element.
    pub fn update_prices(&self) -> WidgetResult<RenderReport> {
        self.binder.render_all()
    }

    /// Re-render every currency symbol placeholder.
    pub fn update_currency_symbols(&self) -> usize {
        self.binder.render_symbols()
    }

    /// Register a callback for widget events.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&WidgetEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(callback);
    }

    /// The rate store backing conversions.
    pub fn rates(&self) -> &RateStore {
        &self.rates
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Whether the widget fetches data.
    pub fn is_headless(&self) -> bool {
        self.source.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::{ACTIVE_CLASS, CLICKABLE_PRICE_CLASS};
    use crate::dom::memory::MemoryDom;
    use crate::dom::NodeId;
    use crate::storage::{MemoryStore, ACTIVE_CURRENCY_KEY};
    use bitcoinprices_fx::{FxError, RateTable, StaticRateSource};
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;
    use serde_json::json;

    struct Page {
        dom: Arc<MemoryDom>,
        price: NodeId,
        bare_price: NodeId,
        broken_price: NodeId,
        symbol: NodeId,
        menu: NodeId,
        menu_list: NodeId,
    }

    fn make_page() -> Page {
        let dom = Arc::new(MemoryDom::new());
        let body = dom.create(None, "body");

        let price = dom.create(Some(body), "span");
        dom.set_attribute(price, "data-btc-price", "0.5");

        let bare_price = dom.create(Some(body), "span");
        dom.set_attribute(bare_price, "data-btc-price", "2");
        dom.set_attribute(bare_price, "data-no-currency-symbol", "");

        let broken_price = dom.create(Some(body), "span");
        dom.set_attribute(broken_price, "data-btc-price", "call us");

        let symbol = dom.create(Some(body), "span");
        dom.add_class(symbol, "currency-symbol");

        let menu = dom.create(Some(body), "div");
        dom.add_class(menu, "currency-dropdown");
        let menu_list = dom.create(Some(menu), "ul");

        Page {
            dom,
            price,
            bare_price,
            broken_price,
            symbol,
            menu,
            menu_list,
        }
    }

    fn rates() -> serde_json::Value {
        json!({
            "USD": {"24h_avg": 603.12, "last": 600.0},
            "EUR": {"24h_avg": 440.5},
            "CNY": {"24h_avg": 3700},
            "timestamp": "Sat, 14 Dec 2013 12:00:00 -0000"
        })
    }

    fn config() -> WidgetConfig {
        let mut config = WidgetConfig::default();
        config.symbols.insert(Currency::btc(), "฿".to_string());
        config.symbols.insert(Currency::usd(), "$".to_string());
        config.symbols.insert(Currency::eur(), "€".to_string());
        config
    }

    fn widget_on(page: &Page, config: WidgetConfig, store: Arc<MemoryStore>) -> BitcoinPrices {
        let source = Arc::new(StaticRateSource::new("test", rates()));
        BitcoinPrices::init_with_source(config, page.dom.clone(), store, source).unwrap()
    }

    fn menu_entry(page: &Page, code: &str) -> NodeId {
        page.dom
            .children(page.menu_list)
            .into_iter()
            .find(|n| page.dom.attribute(*n, "data-currency").as_deref() == Some(code))
            .unwrap()
    }

    #[test]
    fn test_headless_conversion() {
        let page = make_page();
        let mut config = config();
        config.ux.click_prices = false;
        config.ux.menu = false;

        let widget =
            BitcoinPrices::init(config, page.dom.clone(), Arc::new(MemoryStore::new())).unwrap();
        assert!(widget.is_headless());

        let result = widget.convert(dec!(1), &Currency::btc(), &Currency::usd());
        assert_eq!(result, Err(WidgetError::Fx(FxError::RateUnavailable)));

        widget.rates().replace(
            RateTable::from_value(json!({"USD": {"24h_avg": 0.5}}), "spoof").unwrap(),
        );

        assert_eq!(
            widget.convert(dec!(1.0), &Currency::usd(), &Currency::btc()).unwrap(),
            dec!(2.0)
        );
        assert_eq!(
            widget.convert(dec!(1.0), &Currency::btc(), &Currency::usd()).unwrap(),
            dec!(0.5)
        );

        // Nothing was rendered on its own
        assert_eq!(page.dom.text(page.price), "");
        assert!(page.dom.triggered().is_empty());
    }

    #[tokio::test]
    async fn test_headless_load_needs_source() {
        let page = make_page();
        let widget =
            BitcoinPrices::start(config(), page.dom.clone(), Arc::new(MemoryStore::new()))
                .await
                .unwrap();

        assert_eq!(widget.load_data().await, Err(WidgetError::NoRateSource));
    }

    #[tokio::test]
    async fn test_load_renders_page() {
        let page = make_page();
        let widget = widget_on(&page, config(), Arc::new(MemoryStore::new()));

        widget.load_data().await.unwrap();

        assert_eq!(page.dom.text(page.price), "0.50000000 ฿");
        assert_eq!(page.dom.text(page.bare_price), "2.00000000");
        assert_eq!(page.dom.text(page.broken_price), "");
        assert_eq!(page.dom.text(page.symbol), "฿");
        assert!(page.dom.has_class(page.price, CLICKABLE_PRICE_CLASS));
        assert_eq!(page.dom.triggered(), vec!["marketdataavailable"]);
    }

    #[tokio::test]
    async fn test_click_cycles_currency() {
        let page = make_page();
        let store = Arc::new(MemoryStore::new());
        let widget = widget_on(&page, config(), store.clone());
        widget.load_data().await.unwrap();

        page.dom.click(page.price);

        assert_eq!(widget.get_active_currency(), Currency::usd());
        assert_eq!(store.get(ACTIVE_CURRENCY_KEY), Some("USD".to_string()));
        assert_eq!(page.dom.text(page.price), "301.56 $");
        assert_eq!(page.dom.text(page.bare_price), "1206.24");
        assert_eq!(page.dom.text(page.symbol), "$");

        page.dom.click(page.bare_price);
        assert_eq!(page.dom.text(page.price), "220.25 €");

        page.dom.click(page.price);
        // CNY has no symbol configured
        assert_eq!(page.dom.text(page.price), "1850.00 CNY");

        page.dom.click(page.price);
        assert_eq!(page.dom.text(page.price), "0.50000000 ฿");
    }

    #[tokio::test]
    async fn test_menu() {
        let page = make_page();
        let widget = widget_on(&page, config(), Arc::new(MemoryStore::new()));
        widget.load_data().await.unwrap();

        let entries = page.dom.children(page.menu_list);
        assert_eq!(entries.len(), 4);
        assert!(page.dom.has_class(menu_entry(&page, "BTC"), ACTIVE_CLASS));

        let anchor = page.dom.children(menu_entry(&page, "USD"))[0];
        assert_eq!(page.dom.text(anchor), "$");
        assert_eq!(page.dom.attribute(anchor, "role"), Some("menuitem".to_string()));

        page.dom.click(menu_entry(&page, "EUR"));

        assert_eq!(widget.get_active_currency(), Currency::eur());
        assert!(page.dom.has_class(menu_entry(&page, "EUR"), ACTIVE_CLASS));
        assert!(!page.dom.has_class(menu_entry(&page, "BTC"), ACTIVE_CLASS));
        assert_eq!(page.dom.text(page.price), "220.25 €");
        assert_eq!(page.dom.query_within(page.menu, ".currency-menu-entry").len(), 4);
    }

    #[tokio::test]
    async fn test_reload_does_not_rebind() {
        let page = make_page();
        let widget = widget_on(&page, config(), Arc::new(MemoryStore::new()));

        widget.load_data().await.unwrap();
        widget.load_data().await.unwrap();

        assert_eq!(page.dom.handler_count(page.price), 1);
        assert_eq!(page.dom.children(page.menu_list).len(), 4);

        page.dom.click(page.price);
        assert_eq!(widget.get_active_currency(), Currency::usd());
    }

    #[tokio::test]
    async fn test_load_failure_is_signalled() {
        let page = make_page();
        let source = Arc::new(StaticRateSource::failing("test", "connection refused"));
        let widget = BitcoinPrices::init_with_source(
            config(),
            page.dom.clone(),
            Arc::new(MemoryStore::new()),
            source,
        )
        .unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        widget.subscribe(move |event| recorder.lock().push(event.clone()));

        let result = widget.load_data().await;

        assert_eq!(
            result,
            Err(WidgetError::Fx(FxError::DataLoadFailed(
                "connection refused".to_string()
            )))
        );
        assert_eq!(
            *seen.lock(),
            vec![WidgetEvent::DataLoadFailed(
                "Failed to load market data: connection refused".to_string()
            )]
        );
        assert_eq!(page.dom.triggered(), vec!["marketdataerror"]);
        assert_eq!(page.dom.text(page.price), "");
        assert_eq!(page.dom.handler_count(page.price), 0);
    }

    #[tokio::test]
    async fn test_update_prices_reports_conversion_errors() {
        let page = make_page();
        let mut config = config();
        config.currencies.push(Currency::new("GBP"));
        let store = Arc::new(MemoryStore::with_entry(ACTIVE_CURRENCY_KEY, "GBP"));
        let widget = widget_on(&page, config, store);
        widget.load_data().await.unwrap();

        let result = widget.update_prices();
        assert_eq!(
            result,
            Err(WidgetError::Fx(FxError::UnknownCurrency(Currency::new("GBP"))))
        );
    }

    #[tokio::test]
    async fn test_update_prices_skips_malformed() {
        let page = make_page();
        let widget = widget_on(&page, config(), Arc::new(MemoryStore::new()));
        widget.load_data().await.unwrap();

        let report = widget.update_prices().unwrap();
        assert_eq!(report, RenderReport { rendered: 2, skipped: 1 });
        assert_eq!(widget.update_currency_symbols(), 1);
    }

    #[tokio::test]
    async fn test_update_prices_skips_out_of_range() {
        let dom = Arc::new(MemoryDom::new());
        let body = dom.create(None, "body");
        let huge = dom.create(Some(body), "span");
        dom.set_attribute(huge, "data-btc-price", "1000000000000000000000000000");
        let normal = dom.create(Some(body), "span");
        dom.set_attribute(normal, "data-btc-price", "0.5");

        let store = Arc::new(MemoryStore::with_entry(ACTIVE_CURRENCY_KEY, "USD"));
        let source = Arc::new(StaticRateSource::new("test", rates()));
        let widget = BitcoinPrices::init_with_source(config(), dom.clone(), store, source).unwrap();
        widget.load_data().await.unwrap();

        let report = widget.update_prices().unwrap();
        assert_eq!(report, RenderReport { rendered: 1, skipped: 1 });
        assert_eq!(dom.text(normal), "301.56 $");
        assert_eq!(dom.text(huge), "");
    }

    #[tokio::test]
    async fn test_clickable_symbols() {
        let page = make_page();
        let mut config = config();
        config.ux.clickable_currency_symbol = true;
        config.ux.menu = false;
        let widget = widget_on(&page, config, Arc::new(MemoryStore::new()));
        widget.load_data().await.unwrap();

        page.dom.click(page.symbol);

        assert_eq!(widget.get_active_currency(), Currency::usd());
        assert_eq!(page.dom.text(page.symbol), "$");
        assert!(page.dom.children(page.menu_list).is_empty());
    }

    #[tokio::test]
    async fn test_custom_click_selector() {
        let page = make_page();
        let button = page.dom.create(None, "button");
        page.dom.add_class(button, "price-toggle");

        let mut config = config();
        config.clickable_price_selector = Some(".price-toggle".to_string());
        let widget = widget_on(&page, config, Arc::new(MemoryStore::new()));
        widget.load_data().await.unwrap();

        assert_eq!(page.dom.handler_count(page.price), 0);
        page.dom.click(button);
        assert_eq!(widget.get_active_currency(), Currency::usd());
    }

    #[test]
    fn test_reset_and_toggle() {
        let page = make_page();
        let store = Arc::new(MemoryStore::with_entry(ACTIVE_CURRENCY_KEY, "XYZ"));
        let widget = widget_on(&page, config(), store);

        assert_eq!(widget.get_active_currency(), Currency::new("XYZ"));
        widget.reset_currency();
        assert_eq!(widget.get_active_currency(), Currency::btc());

        assert_eq!(widget.toggle_next_active_currency(), Currency::usd());
        assert_eq!(page.dom.triggered(), vec!["activecurrencychange"]);
    }

    #[test]
    fn test_format_price() {
        let page = make_page();
        let widget = widget_on(&page, config(), Arc::new(MemoryStore::new()));

        assert_eq!(
            widget.format_price(dec!(1.23456789), &Currency::btc(), true),
            "1.23456789 ฿"
        );
        assert_eq!(widget.format_price(dec!(1.236), &Currency::usd(), true), "1.24 $");
        assert_eq!(widget.currency_symbol(&Currency::cny()), "CNY");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let page = make_page();
        let mut config = config();
        config.currencies.clear();

        let result = BitcoinPrices::init(config, page.dom.clone(), Arc::new(MemoryStore::new()));
        assert!(matches!(result, Err(WidgetError::ConfigInvalid(_))));
    }
}
