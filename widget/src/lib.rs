//! bitcoinprices Widget
//!
//! Shows bitcoin prices on a page in the currency the visitor picks. Priced
//! elements carry their amount in the base unit; the widget converts them with
//! periodically fetched exchange rates, lets the visitor cycle currencies by
//! clicking a price or choosing from a menu, and remembers the choice.
//!
//! The document and the preference store are supplied by the host through the
//! [`Dom`] and [`KeyValueStore`] traits.

pub mod binder;
pub mod config;
pub mod dom;
pub mod error;
pub mod events;
pub mod state;
pub mod storage;
pub mod widget;

pub use binder::{PageBinder, RenderReport};
pub use config::{UxConfig, WidgetConfig};
pub use dom::{escape_html, ClickHandler, Dom, NewElement, NodeId};
pub use error::{WidgetError, WidgetResult};
pub use events::{EventBus, WidgetEvent};
pub use state::ActiveCurrencyState;
pub use storage::{KeyValueStore, MemoryStore, ACTIVE_CURRENCY_KEY};
pub use widget::BitcoinPrices;
