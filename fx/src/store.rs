//! Shared holder for the most recent rate table.

use std::sync::Arc;

use bitcoinprices_common::Currency;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use crate::rate_table::{RateRecord, RateTable};

/// Summary of the loaded snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotInfo {
    pub fetched_at: DateTime<Utc>,
    pub source: String,
    pub currencies: Vec<Currency>,
}

/// Holds the latest [`RateTable`].
///
/// Clones share the same table. A replace swaps the whole snapshot; readers
/// holding the previous `Arc` keep a consistent view.
#[derive(Debug, Clone, Default)]
pub struct RateStore {
    table: Arc<RwLock<Option<Arc<RateTable>>>>,
}

impl RateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored table.
    pub fn replace(&self, table: RateTable) {
        debug!(
            source = table.source(),
            currencies = table.len(),
            "Replacing rate table"
        );
        *self.table.write() = Some(Arc::new(table));
    }

    /// Drop the stored table, returning to the never-loaded state.
    pub fn clear(&self) {
        *self.table.write() = None;
    }

    /// Whether a table has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.table.read().is_some()
    }

    /// Current snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<RateTable>> {
        self.table.read().clone()
    }

    /// Rate record for a currency. `None` if nothing is loaded or the
    /// currency is absent.
    pub fn get(&self, currency: &Currency) -> Option<RateRecord> {
        self.table
            .read()
            .as_ref()
            .and_then(|table| table.get(currency).cloned())
    }

    /// Metadata of the loaded snapshot.
    pub fn snapshot_info(&self) -> Option<SnapshotInfo> {
        self.snapshot().map(|table| SnapshotInfo {
            fetched_at: table.fetched_at(),
            source: table.source().to_string(),
            currencies: table.currencies(),
        })
    }
}
