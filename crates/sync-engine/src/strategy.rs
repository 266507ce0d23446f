// crates/sync-engine/src/strategy.rs
//! Sync strategies: where state lives outside the store

use crate::error::SyncResult;
use crate::store::StateStream;
use crate::stream::{broadcast_stream, distinct_until_changed};
use async_trait::async_trait;
use futures::future;
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use statesync_core::{shallow_equal_opt, BaseState};
use statesync_url::{
    encode_state_param, get_state_from_url, AppUrl, HashedItemStore, MemoryHistory,
    StateLocation, UrlControls,
};
use std::sync::Arc;

/// Options for a storage write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToStorageOptions {
    /// Overwrite the current entry instead of creating a new one
    pub replace: bool,
}

/// Persistence policy for one kind of storage
#[async_trait]
pub trait SyncStrategy: Send + Sync {
    /// Serializes `state` and stores it under `key`
    async fn to_storage(
        &self,
        key: &str,
        state: &BaseState,
        opts: ToStorageOptions,
    ) -> SyncResult<()>;

    /// Reads the state stored under `key`
    ///
    /// `Ok(None)` means nothing is stored, which differs from an empty state.
    async fn from_storage(&self, key: &str) -> SyncResult<Option<BaseState>>;

    /// Future states stored under `key` by someone else, if the storage can tell
    ///
    /// Implementations deduplicate structurally equal consecutive states and
    /// never emit the state that is current when the stream is created. The
    /// driver treats an emission as a signal and re-reads [`Self::from_storage`].
    fn storage_changes(&self, _key: &str) -> Option<StateStream> {
        None
    }
}

/// Built-in strategy selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStrategyKind {
    /// State is written into the URL as rison
    #[default]
    Url,
    /// The URL holds a hash; the state itself goes to session storage
    HashedUrl,
}

/// What the built-in URL strategies operate on
#[derive(Debug, Clone)]
pub struct UrlSyncContext {
    pub controls: UrlControls,
    pub hashed_items: HashedItemStore,
    pub location: StateLocation,
}

impl UrlSyncContext {
    pub fn new(controls: UrlControls, hashed_items: HashedItemStore) -> Self {
        Self {
            controls,
            hashed_items,
            location: StateLocation::default(),
        }
    }

    /// Context over a fresh history and in-memory session storage
    pub fn in_memory(initial_url: impl Into<String>) -> Self {
        Self::new(
            UrlControls::new(MemoryHistory::new(initial_url)),
            HashedItemStore::in_memory(),
        )
    }

    pub fn with_location(mut self, location: StateLocation) -> Self {
        self.location = location;
        self
    }
}

/// Stores state in a URL parameter named by the sync key
///
/// Writes are batched through [`UrlControls::update_async`], so several
/// keys written in one turn produce a single history entry.
#[derive(Debug, Clone)]
pub struct UrlSyncStrategy {
    ctx: UrlSyncContext,
    use_hash: bool,
}

impl UrlSyncStrategy {
    pub fn new(ctx: UrlSyncContext, use_hash: bool) -> Self {
        Self { ctx, use_hash }
    }

    /// Whether state goes to session storage behind a hash
    pub fn use_hash(&self) -> bool {
        self.use_hash
    }
}

#[async_trait]
impl SyncStrategy for UrlSyncStrategy {
    async fn to_storage(
        &self,
        key: &str,
        state: &BaseState,
        opts: ToStorageOptions,
    ) -> SyncResult<()> {
        let value = encode_state_param(state, self.use_hash, &self.ctx.hashed_items)?;
        let key = key.to_string();
        let location = self.ctx.location;

        self.ctx
            .controls
            .update_async(
                move |url| {
                    let mut parsed = AppUrl::parse(url);
                    parsed.set_param(location, &key, &value);
                    parsed.to_string()
                },
                opts.replace,
            )
            .await;
        Ok(())
    }

    async fn from_storage(&self, key: &str) -> SyncResult<Option<BaseState>> {
        let url = self.ctx.controls.get_url();
        Ok(get_state_from_url(
            key,
            &url,
            self.ctx.location,
            &self.ctx.hashed_items,
        ))
    }

    fn storage_changes(&self, key: &str) -> Option<StateStream> {
        let rx = self.ctx.controls.listen();
        let hashed = self.ctx.hashed_items.clone();
        let location = self.ctx.location;
        let key = key.to_string();
        let read = move |url: &str| get_state_from_url(&key, url, location, &hashed);

        let initial = read(&self.ctx.controls.get_url());
        let states = broadcast_stream(rx).map(move |update| read(&update.location));

        let changes = distinct_until_changed(states, initial, |a, b| {
            shallow_equal_opt(a.as_ref(), b.as_ref())
        })
        .filter_map(future::ready);

        Some(changes.boxed())
    }
}

/// The built-in strategies for one `sync_state` call
#[derive(Clone)]
pub struct BuiltinStrategies {
    url: Arc<dyn SyncStrategy>,
    hashed_url: Arc<dyn SyncStrategy>,
}

impl BuiltinStrategies {
    pub fn get(&self, kind: SyncStrategyKind) -> Arc<dyn SyncStrategy> {
        match kind {
            SyncStrategyKind::Url => Arc::clone(&self.url),
            SyncStrategyKind::HashedUrl => Arc::clone(&self.hashed_url),
        }
    }
}

/// Builds the built-in strategies over a context
pub fn create_strategies(ctx: &UrlSyncContext) -> BuiltinStrategies {
    BuiltinStrategies {
        url: Arc::new(UrlSyncStrategy::new(ctx.clone(), false)),
        hashed_url: Arc::new(UrlSyncStrategy::new(ctx.clone(), true)),
    }
}
