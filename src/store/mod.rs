//! Key-value blob storage for persisted client state.
//!
//! Values are JSON strings. Three process-wide keys are used: render history,
//! usage stats and the signed-in user.

mod file;

pub use file::FileStore;

use crate::error::{AtomError, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    History,
    UsageStats,
    CurrentUser,
}

impl StoreKey {
    pub const ALL: [StoreKey; 3] = [StoreKey::History, StoreKey::UsageStats, StoreKey::CurrentUser];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::History => "atomrender_history",
            StoreKey::UsageStats => "atomrender_usage",
            StoreKey::CurrentUser => "atomrender_user",
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: StoreKey) -> Result<Option<String>>;
    fn set(&self, key: StoreKey, value: &str) -> Result<()>;
    fn remove(&self, key: StoreKey) -> Result<()>;
}

/// Non-persistent store, used for tests and dry runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<StoreKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(|_| AtomError::LockPoisoned)?;
        Ok(entries.get(&key).cloned())
    }

    fn set(&self, key: StoreKey, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| AtomError::LockPoisoned)?;
        entries.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<()> {
        let mut entries = self.entries.write().map_err(|_| AtomError::LockPoisoned)?;
        entries.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_operations() {
        let store = MemoryStore::new();
        assert_eq!(store.get(StoreKey::History).unwrap(), None);

        store.set(StoreKey::History, "[]").unwrap();
        store.set(StoreKey::CurrentUser, "{}").unwrap();
        assert_eq!(store.get(StoreKey::History).unwrap().as_deref(), Some("[]"));

        store.remove(StoreKey::History).unwrap();
        assert_eq!(store.get(StoreKey::History).unwrap(), None);
        assert_eq!(store.get(StoreKey::CurrentUser).unwrap().as_deref(), Some("{}"));

        // Removing a missing key is not an error
        store.remove(StoreKey::UsageStats).unwrap();
    }

    #[test]
    fn test_keys_are_distinct() {
        let names: std::collections::HashSet<_> =
            StoreKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), StoreKey::ALL.len());
    }
}
