// crates/config/src/url_settings.rs
//! URL storage configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use statesync_url::{
    HashedItemStore, MemorySessionStorage, StateLocation, DEFAULT_QUOTA_BYTES, MIN_HASH_LENGTH,
};
use std::sync::Arc;

/// How state is laid out in the URL and in session storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UrlSettings {
    /// Which part of the URL holds state parameters
    pub state_location: StateLocation,

    /// Shortest hash handed out for hashed state (7-64)
    pub min_hash_length: usize,

    /// Session storage quota in bytes (1 KiB - 64 MiB)
    pub session_storage_quota_bytes: usize,

    /// Unread changes a listener may fall behind (1-4096)
    pub change_buffer: usize,
}

impl Default for UrlSettings {
    fn default() -> Self {
        Self {
            state_location: StateLocation::HashQuery,
            min_hash_length: MIN_HASH_LENGTH,
            session_storage_quota_bytes: DEFAULT_QUOTA_BYTES,
            change_buffer: 64,
        }
    }
}

impl UrlSettings {
    /// Creates hashed storage sized by these settings
    pub fn hashed_item_store(&self) -> HashedItemStore {
        let storage = MemorySessionStorage::with_quota(self.session_storage_quota_bytes);
        HashedItemStore::new(Arc::new(storage)).with_min_hash_length(self.min_hash_length)
    }
}

impl ConfigSection for UrlSettings {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Validator::collect_errors(vec![
            Validator::in_range(self.min_hash_length, 7, 64, "url.min_hash_length"),
            Validator::in_range(
                self.session_storage_quota_bytes,
                1024,
                64 * 1024 * 1024,
                "url.session_storage_quota_bytes",
            ),
            Validator::in_range(self.change_buffer, 1, 4096, "url.change_buffer"),
        ])
    }

    fn merge(&mut self, other: Self) {
        self.state_location = other.state_location;
        self.min_hash_length = other.min_hash_length;
        self.session_storage_quota_bytes = other.session_storage_quota_bytes;
        self.change_buffer = other.change_buffer;
    }

    fn section_name(&self) -> &'static str {
        "url"
    }
}
