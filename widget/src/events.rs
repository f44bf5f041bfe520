//! Widget events and their dispatch.

use std::fmt;
use std::sync::{Arc, Weak};

use bitcoinprices_common::Currency;
use parking_lot::Mutex;

/// Events raised by the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// A rate table was loaded.
    MarketDataAvailable,
    /// The visitor selected another currency.
    ActiveCurrencyChange(Currency),
    /// Fetching rate data failed.
    DataLoadFailed(String),
}

impl WidgetEvent {
    /// Event name forwarded to the host document.
    pub fn name(&self) -> &'static str {
        match self {
            WidgetEvent::MarketDataAvailable => "marketdataavailable",
            WidgetEvent::ActiveCurrencyChange(_) => "activecurrencychange",
            WidgetEvent::DataLoadFailed(_) => "marketdataerror",
        }
    }
}

/// Event subscriber callback.
pub type Subscriber = Arc<dyn Fn(&WidgetEvent) + Send + Sync>;

/// Synchronous event dispatcher.
///
/// Subscribers run in subscription order on the emitting thread. The list is
/// snapshotted before dispatch, so a subscriber may emit or subscribe; those
/// added during dispatch see only later events.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl EventBus {
    /// Create a bus without subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for every event.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(&WidgetEvent) + Send + Sync + 'static,
    {
        self.subscribers.lock().push(Arc::new(callback));
    }

    /// Dispatch an event to all subscribers.
    pub fn emit(&self, event: WidgetEvent) {
        let subscribers = self.subscribers.lock().clone();
        for subscriber in subscribers {
            subscriber(&event);
        }
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Handle that does not keep the bus alive.
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Non-owning handle to an [`EventBus`], held by callbacks the bus itself
/// (indirectly) owns.
#[derive(Clone, Default)]
pub struct WeakEventBus {
    subscribers: Weak<Mutex<Vec<Subscriber>>>,
}

impl WeakEventBus {
    /// The bus, if it is still alive.
    pub fn upgrade(&self) -> Option<EventBus> {
        self.subscribers
            .upgrade()
            .map(|subscribers| EventBus { subscribers })
    }

    /// Emit if the bus is still alive.
    pub fn emit(&self, event: WidgetEvent) {
        if let Some(bus) = self.upgrade() {
            bus.emit(event);
        }
    }
}

impl fmt::Debug for WeakEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEventBus")
            .field("alive", &(self.subscribers.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_reaches_subscribers_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for id in 0..2 {
            let seen = seen.clone();
            bus.subscribe(move |event| seen.lock().push((id, event.name())));
        }

        bus.emit(WidgetEvent::MarketDataAvailable);

        assert_eq!(
            *seen.lock(),
            vec![(0, "marketdataavailable"), (1, "marketdataavailable")]
        );
    }

    #[test]
    fn test_reentrant_emit_and_subscribe() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner_bus = bus.clone();
        let inner_seen = seen.clone();
        bus.subscribe(move |event| {
            inner_seen.lock().push(event.clone());
            if *event == WidgetEvent::MarketDataAvailable {
                inner_bus.subscribe(|_| {});
                inner_bus.emit(WidgetEvent::ActiveCurrencyChange(Currency::usd()));
            }
        });

        bus.emit(WidgetEvent::MarketDataAvailable);

        assert_eq!(
            *seen.lock(),
            vec![
                WidgetEvent::MarketDataAvailable,
                WidgetEvent::ActiveCurrencyChange(Currency::usd()),
            ]
        );
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_weak_bus() {
        let bus = EventBus::new();
        let weak = bus.downgrade();
        assert!(weak.upgrade().is_some());

        drop(bus);
        assert!(weak.upgrade().is_none());
        // Emitting on a dropped bus is a no-op
        weak.emit(WidgetEvent::MarketDataAvailable);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(
            WidgetEvent::ActiveCurrencyChange(Currency::eur()).name(),
            "activecurrencychange"
        );
        assert_eq!(
            WidgetEvent::DataLoadFailed("x".into()).name(),
            "marketdataerror"
        );
    }
}
