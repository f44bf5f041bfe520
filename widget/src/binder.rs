//! Keeps the page in sync with rates and the active currency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bitcoinprices_common::{parse_amount, Currency};
use bitcoinprices_fx::{CurrencyConverter, FxError, PriceFormatter};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::config::WidgetConfig;
use crate::dom::{ClickHandler, Dom, NewElement, NodeId};
use crate::error::{WidgetError, WidgetResult};
use crate::events::{WeakEventBus, WidgetEvent};
use crate::state::ActiveCurrencyState;

/// Class marking priced elements as interactive.
pub const CLICKABLE_PRICE_CLASS: &str = "clickable-price";

/// Class of generated menu entries.
pub const MENU_ENTRY_CLASS: &str = "currency-menu-entry";

/// Attribute of a menu entry holding its currency code.
pub const MENU_CURRENCY_ATTRIBUTE: &str = "data-currency";

/// Class of the active menu entry.
pub const ACTIVE_CLASS: &str = "active";

/// Outcome of a price render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Elements updated.
    pub rendered: usize,
    /// Elements skipped for malformed or out-of-range prices.
    pub skipped: usize,
}

/// Finds priced elements and symbol placeholders, renders them and wires the
/// interactions that change the active currency.
#[derive(Clone)]
pub struct PageBinder {
    dom: Arc<dyn Dom>,
    config: Arc<WidgetConfig>,
    converter: CurrencyConverter,
    formatter: PriceFormatter,
    state: ActiveCurrencyState,
    events: WeakEventBus,
    ux_installed: Arc<AtomicBool>,
}

impl PageBinder {
    /// Create a binder. `events` is where currency changes are announced.
    pub fn new(
        dom: Arc<dyn Dom>,
        config: Arc<WidgetConfig>,
        converter: CurrencyConverter,
        formatter: PriceFormatter,
        state: ActiveCurrencyState,
        events: WeakEventBus,
    ) -> Self {
        Self {
            dom,
            config,
            converter,
            formatter,
            state,
            events,
            ux_installed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Render every priced element in the active currency.
    ///
    /// Elements whose price does not parse, or whose converted price is out of
    /// range, are skipped. Other conversion failures abort the pass and are
    /// returned.
    pub fn render_all(&self) -> WidgetResult<RenderReport> {
        let active = self.state.get();
        let base = &self.config.price_original_currency;
        let mut report = RenderReport::default();

        for node in self.dom.query_all(&self.config.price_selector()) {
            let price = match self.read_price(node) {
                Ok(price) => price,
                Err(e) => {
                    warn!(node = %node, error = %e, "Skipping priced element");
                    report.skipped += 1;
                    continue;
                }
            };

            let converted = match self.converter.convert(price, base, &active) {
                Ok(converted) => converted,
                Err(e @ FxError::AmountOutOfRange { .. }) => {
                    warn!(node = %node, error = %e, "Skipping priced element");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            let with_symbol = self
                .dom
                .attribute(node, &self.config.no_symbol_attribute)
                .is_none();

            self.dom
                .set_text(node, &self.formatter.format(converted, &active, with_symbol));
            report.rendered += 1;
        }

        debug!(
            currency = %active,
            rendered = report.rendered,
            skipped = report.skipped,
            "Rendered prices"
        );
        Ok(report)
    }

    /// Write the active currency's symbol into every placeholder.
    pub fn render_symbols(&self) -> usize {
        let active = self.state.get();
        let symbol = self.formatter.symbol_for(&active);
        let nodes = self.dom.query_all(&self.config.symbol_selector);

        for node in &nodes {
            self.dom.set_text(*node, symbol);
        }
        nodes.len()
    }

    /// Re-render prices and symbols.
    pub fn refresh(&self) -> WidgetResult<RenderReport> {
        let report = self.render_all()?;
        self.render_symbols();
        Ok(report)
    }

    /// Make clicks on prices (and optionally symbols) select the next currency.
    pub fn install_click_cycle(&self) -> usize {
        for node in self.dom.query_all(&self.config.price_selector()) {
            self.dom.add_class(node, CLICKABLE_PRICE_CLASS);
        }

        let mut targets = self.dom.query_all(&self.config.click_selector());
        if self.config.ux.clickable_currency_symbol {
            targets.extend(self.dom.query_all(&self.config.symbol_selector));
        }
        targets.sort();
        targets.dedup();

        let state = self.state.clone();
        let events = self.events.clone();
        let handler: ClickHandler = Arc::new(move |_: NodeId| {
            let currency = state.advance();
            events.emit(WidgetEvent::ActiveCurrencyChange(currency));
        });

        for node in &targets {
            self.dom.on_click(*node, handler.clone());
        }
        targets.len()
    }

    /// Fill each currency menu with one entry per configured currency and keep
    /// the active entry highlighted.
    pub fn install_menu(&self) -> usize {
        let menus = self.dom.query_all(&self.config.menu_selector);

        for menu in &menus {
            let Some(list) = self.dom.query_within(*menu, "ul").into_iter().next() else {
                warn!(menu = %menu, "Currency menu has no list");
                continue;
            };

            for currency in self.state.currencies() {
                let entry = self.dom.append_element(list, &self.menu_entry(currency));
                self.dom.on_click(entry, self.menu_handler());
            }

            self.highlight_menu(*menu);
        }

        if let Some(bus) = self.events.upgrade() {
            let binder = self.clone();
            let menus = menus.clone();
            bus.subscribe(move |event| {
                if let WidgetEvent::ActiveCurrencyChange(_) = event {
                    for menu in &menus {
                        binder.highlight_menu(*menu);
                    }
                }
            });
        }

        menus.len()
    }

    /// Render and install interactions after data has arrived. Interactions
    /// are installed only once.
    pub fn on_data_available(&self) {
        if let Err(e) = self.refresh() {
            error!(error = %e, "Failed to render prices");
        }

        if self.ux_installed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.install_ux();
    }

    fn install_ux(&self) {
        if self.config.ux.click_prices {
            let count = self.install_click_cycle();
            debug!(targets = count, "Installed click cycling");
        }

        if self.config.ux.menu {
            let count = self.install_menu();
            debug!(menus = count, "Installed currency menu");
        }

        if let Some(bus) = self.events.upgrade() {
            let binder = self.clone();
            bus.subscribe(move |event| {
                if let WidgetEvent::ActiveCurrencyChange(currency) = event {
                    info!(currency = %currency, "Active currency changed");
                    if let Err(e) = binder.refresh() {
                        error!(currency = %currency, error = %e, "Failed to render prices");
                    }
                }
            });
        }
    }

    fn read_price(&self, node: NodeId) -> WidgetResult<Decimal> {
        let attribute = &self.config.price_attribute;
        let raw = self.dom.attribute(node, attribute).unwrap_or_default();
        parse_amount(&raw).map_err(|_| WidgetError::MalformedPriceAttribute {
            attribute: attribute.clone(),
            value: raw,
        })
    }

    fn menu_entry(&self, currency: &Currency) -> NewElement {
        NewElement::new("li")
            .class(MENU_ENTRY_CLASS)
            .attr(MENU_CURRENCY_ATTRIBUTE, currency.code())
            .child(
                NewElement::new("a")
                    .attr("role", "menuitem")
                    .attr("href", "#")
                    .text(self.formatter.symbol_for(currency)),
            )
    }

    fn menu_handler(&self) -> ClickHandler {
        let dom = self.dom.clone();
        let state = self.state.clone();
        let events = self.events.clone();

        Arc::new(move |node: NodeId| {
            let Some(code) = dom.attribute(node, MENU_CURRENCY_ATTRIBUTE) else {
                return;
            };
            let currency = Currency::new(code);
            if !state.is_selectable(&currency) {
                warn!(currency = %currency, "Ignoring menu selection");
                return;
            }
            state.set(&currency);
            events.emit(WidgetEvent::ActiveCurrencyChange(currency));
        })
    }

    fn highlight_menu(&self, menu: NodeId) {
        let active = self.state.get();
        let selector = format!("li[{}]", MENU_CURRENCY_ATTRIBUTE);

        for entry in self.dom.query_within(menu, &selector) {
            let code = self.dom.attribute(entry, MENU_CURRENCY_ATTRIBUTE);
            if code.map(Currency::new).as_ref() == Some(&active) {
                self.dom.add_class(entry, ACTIVE_CLASS);
            } else {
                self.dom.remove_class(entry, ACTIVE_CLASS);
            }
        }

        let symbol = self.formatter.symbol_for(&active);
        for node in self.dom.query_within(menu, &self.config.symbol_selector) {
            self.dom.set_text(node, symbol);
        }
    }
}
