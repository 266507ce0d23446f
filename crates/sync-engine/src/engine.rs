// crates/sync-engine/src/engine.rs
//! The reconciliation driver

use crate::error::{SyncError, SyncResult};
use crate::store::{StateStream, Store};
use crate::strategy::{
    create_strategies, SyncStrategy, SyncStrategyKind, ToStorageOptions, UrlSyncContext,
};
use crate::stream::distinct_until_changed;
use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use statesync_core::{shallow_equal, BaseState};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Which side wins when a sync starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitialTruthSource {
    /// Overwrite storage with the store's state
    Store,
    /// Load stored state into the store, or store the store's state if nothing is stored
    #[default]
    Storage,
    /// Touch neither side until something changes
    None,
}

/// A built-in or caller-supplied strategy
#[derive(Clone)]
pub enum StrategySelection {
    Builtin(SyncStrategyKind),
    Custom(Arc<dyn SyncStrategy>),
}

impl Default for StrategySelection {
    fn default() -> Self {
        Self::Builtin(SyncStrategyKind::default())
    }
}

impl From<SyncStrategyKind> for StrategySelection {
    fn from(kind: SyncStrategyKind) -> Self {
        Self::Builtin(kind)
    }
}

impl From<Arc<dyn SyncStrategy>> for StrategySelection {
    fn from(strategy: Arc<dyn SyncStrategy>) -> Self {
        Self::Custom(strategy)
    }
}

impl std::fmt::Debug for StrategySelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin(kind) => f.debug_tuple("Builtin").field(kind).finish(),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// One store kept in sync with storage under one key
#[derive(Clone)]
pub struct SyncConfig {
    pub key: String,
    pub store: Arc<dyn Store>,
    pub strategy: StrategySelection,
    pub initial_truth_source: InitialTruthSource,
}

impl SyncConfig {
    /// Creates a config with the URL strategy and storage as truth source
    pub fn new(key: impl Into<String>, store: Arc<dyn Store>) -> Self {
        Self {
            key: key.into(),
            store,
            strategy: StrategySelection::default(),
            initial_truth_source: InitialTruthSource::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: impl Into<StrategySelection>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_initial_truth_source(mut self, source: InitialTruthSource) -> Self {
        self.initial_truth_source = source;
        self
    }
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("key", &self.key)
            .field("strategy", &self.strategy)
            .field("initial_truth_source", &self.initial_truth_source)
            .finish_non_exhaustive()
    }
}

/// Controls a running sync
///
/// Dropping the handle detaches the sync; call [`SyncHandle::stop`] to end it.
pub struct SyncHandle {
    keys: Vec<String>,
    stop_tx: watch::Sender<bool>,
    stopped: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncHandle {
    /// Stops every link started by the same call
    ///
    /// Writes already in flight complete; nothing new is pushed or pulled.
    /// Calling it again does nothing.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        // tasks that already exited dropped their receivers
        let _ = self.stop_tx.send(true);
        log::info!("Stopped state sync for {}", self.keys.join(", "));
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Keys synced by this handle
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Waits for every link to exit
    ///
    /// Links only exit after [`SyncHandle::stop`] or once both of their
    /// streams have ended.
    pub async fn join(&self) {
        let tasks = std::mem::take(
            &mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for task in tasks {
            if let Err(e) = task.await {
                log::error!("State sync task failed: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHandle")
            .field("keys", &self.keys)
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

/// Starts keeping each config's store in sync with its storage
///
/// Built-in strategies are created over `ctx` for this call only. Each
/// config gets its own task, which runs initialization according to the
/// config's [`InitialTruthSource`] and then handles store and storage
/// changes one at a time. Push and pull failures are logged and do not
/// affect other configs.
pub fn sync_state<I>(ctx: &UrlSyncContext, configs: I) -> SyncResult<SyncHandle>
where
    I: IntoIterator<Item = SyncConfig>,
{
    let configs: Vec<SyncConfig> = configs.into_iter().collect();
    validate_keys(&configs)?;

    let runtime = tokio::runtime::Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
    let strategies = create_strategies(ctx);
    let (stop_tx, stop_rx) = watch::channel(false);

    let keys: Vec<String> = configs.iter().map(|c| c.key.clone()).collect();
    let mut tasks = Vec::with_capacity(configs.len());

    for config in configs {
        let strategy = match config.strategy {
            StrategySelection::Builtin(kind) => strategies.get(kind),
            StrategySelection::Custom(strategy) => strategy,
        };

        // subscribe and seed now so changes made after this call are never missed
        let store_changes = distinct_until_changed(
            config.store.state_changes(),
            config.store.get(),
            shallow_equal,
        )
        .boxed();
        let storage_changes = strategy.storage_changes(&config.key);

        let link = SyncLink {
            key: config.key,
            store: config.store,
            strategy,
            initial_truth_source: config.initial_truth_source,
        };
        tasks.push(runtime.spawn(link.run(store_changes, storage_changes, stop_rx.clone())));
    }

    log::info!("Started state sync for {}", keys.join(", "));

    Ok(SyncHandle {
        keys,
        stop_tx,
        stopped: AtomicBool::new(false),
        tasks: Mutex::new(tasks),
    })
}

fn validate_keys(configs: &[SyncConfig]) -> SyncResult<()> {
    let mut seen = HashSet::new();
    for config in configs {
        if config.key.trim().is_empty() {
            return Err(SyncError::InvalidKey("key must not be empty".to_string()));
        }
        if !seen.insert(config.key.as_str()) {
            return Err(SyncError::DuplicateKey(config.key.clone()));
        }
    }
    Ok(())
}

struct SyncLink {
    key: String,
    store: Arc<dyn Store>,
    strategy: Arc<dyn SyncStrategy>,
    initial_truth_source: InitialTruthSource,
}

impl SyncLink {
    async fn run(
        self,
        mut store_changes: StateStream,
        mut storage_changes: Option<StateStream>,
        mut stop: watch::Receiver<bool>,
    ) {
        if *stop.borrow() {
            return;
        }
        self.initialize(&stop).await;

        let mut store_open = true;
        let mut stop_open = true;

        loop {
            tokio::select! {
                biased;

                changed = stop.changed(), if stop_open => match changed {
                    Ok(()) if *stop.borrow() => break,
                    Ok(()) => {}
                    // handle dropped without stopping
                    Err(_) => stop_open = false,
                },
                // events only signal a change; both paths act on the latest state
                next = store_changes.next(), if store_open => match next {
                    Some(_) => self.push(&self.store.get(), false).await,
                    None => store_open = false,
                },
                next = next_state(storage_changes.as_mut()), if storage_changes.is_some() => match next {
                    Some(_) => self.pull_latest().await,
                    None => storage_changes = None,
                },
                else => break,
            }
        }

        log::debug!("Sync link {} exited", self.key);
    }

    async fn initialize(&self, stop: &watch::Receiver<bool>) {
        match self.initial_truth_source {
            InitialTruthSource::None => {}
            InitialTruthSource::Store => {
                self.push(&self.store.get(), true).await;
            }
            InitialTruthSource::Storage => {
                let stored = match self.strategy.from_storage(&self.key).await {
                    Ok(stored) => stored,
                    Err(e) => {
                        log::warn!("Failed to read {} from storage: {}", self.key, e);
                        None
                    }
                };

                if *stop.borrow() {
                    return;
                }

                match stored {
                    Some(state) => self.pull(state),
                    None => self.push(&self.store.get(), true).await,
                }
            }
        }
    }

    async fn push(&self, state: &BaseState, replace: bool) {
        log::debug!("Pushing {} to storage (replace: {})", self.key, replace);
        let opts = ToStorageOptions { replace };
        if let Err(e) = self.strategy.to_storage(&self.key, state, opts).await {
            log::warn!("Failed to write {} to storage: {}", self.key, e);
        }
    }

    /// Re-reads storage and applies it unless the store already matches
    async fn pull_latest(&self) {
        match self.strategy.from_storage(&self.key).await {
            Ok(Some(stored)) if !shallow_equal(&stored, &self.store.get()) => self.pull(stored),
            Ok(_) => {}
            Err(e) => log::warn!("Failed to read {} from storage: {}", self.key, e),
        }
    }

    fn pull(&self, state: BaseState) {
        log::debug!("Pulling {} from storage", self.key);
        self.store.set(state);
    }
}

async fn next_state(stream: Option<&mut StateStream>) -> Option<BaseState> {
    match stream {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}
