// crates/url-state/src/session_storage.rs
//! Session-scoped key/value storage

use crate::error::{UrlStateError, UrlStateResult};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default quota, matching the usual browser session storage limit
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// A string key/value store with a size quota
pub trait SessionStorage: Send + Sync {
    /// Reads an item
    fn get_item(&self, key: &str) -> Option<String>;

    /// Writes an item, failing with [`UrlStateError::QuotaExceeded`] if it does not fit
    fn set_item(&self, key: &str, value: &str) -> UrlStateResult<()>;

    /// Removes an item if present
    fn remove_item(&self, key: &str);

    /// All stored keys
    fn keys(&self) -> Vec<String>;
}

/// Process-local [`SessionStorage`]
///
/// Usage is counted as the byte length of every key plus its value.
#[derive(Debug)]
pub struct MemorySessionStorage {
    quota_bytes: usize,
    items: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
    /// Creates storage with [`DEFAULT_QUOTA_BYTES`]
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    /// Creates storage with a custom quota
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            quota_bytes,
            items: Mutex::new(HashMap::new()),
        }
    }

    /// Configured quota in bytes
    pub fn quota_bytes(&self) -> usize {
        self.quota_bytes
    }

    /// Bytes currently in use
    pub fn used_bytes(&self) -> usize {
        self.lock().iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> UrlStateResult<()> {
        let mut items = self.lock();
        let others: usize = items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        let needed = key.len() + value.len();

        if others + needed > self.quota_bytes {
            return Err(UrlStateError::QuotaExceeded {
                needed,
                quota: self.quota_bytes,
            });
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.lock().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}
