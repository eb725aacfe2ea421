//! Persisted render log, newest first.

use crate::error::Result;
use crate::store::{KeyValueStore, StoreKey};
use crate::types::{Cost, RenderHistoryItem};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryLog {
    items: Vec<RenderHistoryItem>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the log from the store. Missing or malformed data yields an empty log.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let raw = match store.get(StoreKey::History) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::new(),
            Err(e) => {
                warn!(error = %e, "could not read render history");
                return Self::new();
            }
        };

        match serde_json::from_str::<Vec<RenderHistoryItem>>(&raw) {
            Ok(items) => Self { items },
            Err(e) => {
                warn!(error = %e, "persisted render history malformed, ignoring");
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        let encoded = serde_json::to_string(&self.items)?;
        store.set(StoreKey::History, &encoded)
    }

    /// Add a completed render at the front
    pub fn prepend(&mut self, item: RenderHistoryItem) {
        self.items.insert(0, item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderHistoryItem> {
        self.items.iter()
    }

    pub fn find(&self, id: &str) -> Option<&RenderHistoryItem> {
        self.items.iter().find(|item| item.id.as_str() == id)
    }

    /// Lifetime spend across every recorded render
    pub fn total_cost(&self) -> Cost {
        Cost::from_history(self.items.iter())
    }
}
