// crates/sync-engine/src/lib.rs
//! Bidirectional state sync between stores and storage
//!
//! This crate keeps application state containers in sync with an external
//! storage such as the URL:
//! - [`Store`]: the state container contract, with [`StateContainer`] and [`MappedStore`]
//! - [`SyncStrategy`]: where state is persisted, with built-in URL and hashed URL strategies
//! - [`DistinctUntilChanged`]: the change detector that suppresses no-op updates
//! - [`sync_state`]: the driver that pushes store changes to storage and pulls storage changes into the store
//!
//! # Example
//!
//! ```rust
//! use statesync_sync_engine::{sync_state, StateContainer, SyncConfig, UrlSyncContext};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let ctx = UrlSyncContext::in_memory("http://localhost/app#/home");
//!     let store = Arc::new(StateContainer::new(
//!         json!({"tab": "indexed"}).as_object().cloned().unwrap(),
//!     ));
//!
//!     let handle = sync_state(&ctx, [SyncConfig::new("_a", store.clone())])
//!         .expect("Failed to start sync");
//!
//!     // let the initial push land
//!     tokio::time::sleep(std::time::Duration::from_millis(50)).await;
//!     assert_eq!(ctx.controls.get_url(), "http://localhost/app#/home?_a=(tab:indexed)");
//!
//!     handle.stop();
//!     handle.join().await;
//! }
//! ```

mod engine;
mod error;
mod store;
mod strategy;
mod stream;

pub use engine::{sync_state, InitialTruthSource, StrategySelection, SyncConfig, SyncHandle};
pub use error::{SyncError, SyncResult};
pub use store::{MappedStore, StateContainer, StateStream, Store, DEFAULT_CHANGE_BUFFER};
pub use strategy::{
    create_strategies, BuiltinStrategies, SyncStrategy, SyncStrategyKind, ToStorageOptions,
    UrlSyncContext, UrlSyncStrategy,
};
pub use stream::{broadcast_stream, distinct_until_changed, DistinctUntilChanged};
