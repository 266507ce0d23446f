// crates/config/src/sync_settings.rs
//! Sync defaults configuration section

use crate::validation::{ConfigSection, ValidationError};
use serde::{Deserialize, Serialize};
use statesync_sync_engine::{InitialTruthSource, SyncStrategyKind};

/// Defaults applied to every synced key
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    /// Strategy used when a key does not pick one
    pub default_strategy: SyncStrategyKind,

    /// Which side wins when a sync starts
    pub initial_truth_source: InitialTruthSource,

    /// Keep state in session storage and only a hash in the URL
    pub store_in_session_storage: bool,
}

impl SyncSettings {
    /// The strategy to use once `store_in_session_storage` is applied
    pub fn effective_strategy(&self) -> SyncStrategyKind {
        if self.store_in_session_storage {
            SyncStrategyKind::HashedUrl
        } else {
            self.default_strategy
        }
    }
}

impl ConfigSection for SyncSettings {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        Ok(())
    }

    fn merge(&mut self, other: Self) {
        self.default_strategy = other.default_strategy;
        self.initial_truth_source = other.initial_truth_source;
        self.store_in_session_storage = other.store_in_session_storage;
    }

    fn section_name(&self) -> &'static str {
        "sync"
    }
}
