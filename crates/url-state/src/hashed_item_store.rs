// crates/url-state/src/hashed_item_store.rs
//! Hash-addressed state in session storage

use crate::error::{UrlStateError, UrlStateResult};
use crate::hash::{create_state_hash, is_state_hash, MIN_HASH_LENGTH};
use crate::session_storage::{MemorySessionStorage, SessionStorage};
use statesync_core::{into_base_state, BaseState};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct TouchIndex {
    clock: u64,
    touched: HashMap<String, u64>,
}

impl TouchIndex {
    fn touch(&mut self, key: &str) {
        self.clock += 1;
        self.touched.insert(key.to_string(), self.clock);
    }

    fn last_touched(&self, key: &str) -> u64 {
        self.touched.get(key).copied().unwrap_or(0)
    }
}

/// Stores state JSON under short hashes so the URL only carries the hash
///
/// When storage is full the least recently used hashed items are evicted
/// until the new item fits. Items written by other parties (keys without
/// the hash prefix) are never evicted.
#[derive(Clone)]
pub struct HashedItemStore {
    storage: Arc<dyn SessionStorage>,
    index: Arc<Mutex<TouchIndex>>,
    min_hash_length: usize,
}

impl HashedItemStore {
    /// Creates a store over the given storage
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            index: Arc::new(Mutex::new(TouchIndex::default())),
            min_hash_length: MIN_HASH_LENGTH,
        }
    }

    /// Creates a store over a fresh [`MemorySessionStorage`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStorage::new()))
    }

    /// Overrides the shortest hash handed out
    pub fn with_min_hash_length(mut self, min_hash_length: usize) -> Self {
        self.min_hash_length = min_hash_length.max(1);
        self
    }

    /// The backing storage
    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Reads an item and marks it as recently used
    pub fn get_item(&self, key: &str) -> Option<String> {
        let value = self.storage.get_item(key)?;
        self.lock_index().touch(key);
        Some(value)
    }

    /// Writes an item, evicting old hashed items if storage is full
    pub fn set_item(&self, key: &str, value: &str) -> UrlStateResult<()> {
        loop {
            match self.storage.set_item(key, value) {
                Ok(()) => {
                    self.lock_index().touch(key);
                    return Ok(());
                }
                Err(err @ UrlStateError::QuotaExceeded { .. }) => {
                    let Some(victim) = self.least_recently_used(key) else {
                        log::warn!("Cannot store {}: nothing left to evict", key);
                        return Err(err);
                    };
                    log::debug!("Evicting {} from session storage", victim);
                    self.storage.remove_item(&victim);
                    self.lock_index().touched.remove(&victim);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Stores a state and returns the hash that references it
    pub fn persist_state(&self, state: &BaseState) -> UrlStateResult<String> {
        let json = serde_json::to_string(state)?;
        let hash = create_state_hash(&json, self.min_hash_length, |key| {
            self.storage.get_item(key)
        });
        self.set_item(&hash, &json)?;
        Ok(hash)
    }

    /// Looks up a state by hash
    ///
    /// Returns `None` if the hash is unknown (for example after eviction or in
    /// a new session) or the stored value is not a state object.
    pub fn retrieve_state(&self, hash: &str) -> Option<BaseState> {
        let json = self.get_item(hash)?;
        let parsed = serde_json::from_str::<serde_json::Value>(&json)
            .map_err(UrlStateError::from)
            .and_then(|value| into_base_state(value).map_err(UrlStateError::from));

        match parsed {
            Ok(state) => Some(state),
            Err(e) => {
                log::warn!("Discarding unreadable hashed state {}: {}", hash, e);
                None
            }
        }
    }

    fn least_recently_used(&self, keep: &str) -> Option<String> {
        let index = self.lock_index();
        self.storage
            .keys()
            .into_iter()
            .filter(|k| k != keep && is_state_hash(k))
            .min_by_key(|k| (index.last_touched(k), k.clone()))
    }

    fn lock_index(&self) -> MutexGuard<'_, TouchIndex> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for HashedItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashedItemStore")
            .field("min_hash_length", &self.min_hash_length)
            .finish_non_exhaustive()
    }
}
