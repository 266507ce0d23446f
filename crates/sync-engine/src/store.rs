// crates/sync-engine/src/store.rs
//! The store contract and in-memory stores

use crate::stream::broadcast_stream;
use futures::stream::{BoxStream, StreamExt};
use statesync_core::BaseState;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

/// A stream of state snapshots
pub type StateStream = BoxStream<'static, BaseState>;

/// Default number of unread snapshots a subscriber may fall behind
pub const DEFAULT_CHANGE_BUFFER: usize = 64;

/// An application state container that can be kept in sync
pub trait Store: Send + Sync {
    /// Current state
    fn get(&self) -> BaseState;

    /// Replaces the state
    fn set(&self, state: BaseState);

    /// Snapshots emitted after every future change; nothing is replayed
    fn state_changes(&self) -> StateStream;
}

/// In-memory [`Store`] that notifies subscribers on every `set`
///
/// Setting an equal state still notifies; consumers that care filter
/// through a change detector.
#[derive(Clone)]
pub struct StateContainer {
    state: Arc<RwLock<BaseState>>,
    notifier: broadcast::Sender<BaseState>,
}

impl StateContainer {
    /// Creates a container holding `initial`
    pub fn new(initial: BaseState) -> Self {
        Self::with_change_buffer(initial, DEFAULT_CHANGE_BUFFER)
    }

    /// Creates a container whose subscribers buffer up to `capacity` snapshots
    pub fn with_change_buffer(initial: BaseState, capacity: usize) -> Self {
        let (notifier, _) = broadcast::channel(capacity.max(1));
        Self {
            state: Arc::new(RwLock::new(initial)),
            notifier,
        }
    }

    /// Derives the next state from the current one and sets it
    pub fn transition<F>(&self, f: F)
    where
        F: FnOnce(&BaseState) -> BaseState,
    {
        let next = f(&self.get());
        self.set(next);
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.notifier.receiver_count()
    }
}

impl Default for StateContainer {
    fn default() -> Self {
        Self::new(BaseState::new())
    }
}

impl Store for StateContainer {
    fn get(&self) -> BaseState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, state: BaseState) {
        {
            let mut current = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *current = state.clone();
        }
        // no subscribers is fine
        let _ = self.notifier.send(state);
    }

    fn state_changes(&self) -> StateStream {
        broadcast_stream(self.notifier.subscribe())
    }
}

impl std::fmt::Debug for StateContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateContainer")
            .field("state", &self.get())
            .finish_non_exhaustive()
    }
}

type Selector = Arc<dyn Fn(&BaseState) -> BaseState + Send + Sync>;
type Merger = Arc<dyn Fn(&BaseState, BaseState) -> BaseState + Send + Sync>;

/// A projection of another store
///
/// `select` derives the synced state from the inner state and `merge`
/// folds a synced state back into it. Use it to sync only part of a store
/// or to rename keys before they reach storage.
#[derive(Clone)]
pub struct MappedStore {
    inner: Arc<dyn Store>,
    select: Selector,
    merge: Merger,
}

impl MappedStore {
    pub fn new<S, M>(inner: Arc<dyn Store>, select: S, merge: M) -> Self
    where
        S: Fn(&BaseState) -> BaseState + Send + Sync + 'static,
        M: Fn(&BaseState, BaseState) -> BaseState + Send + Sync + 'static,
    {
        Self {
            inner,
            select: Arc::new(select),
            merge: Arc::new(merge),
        }
    }

    /// Syncs only the listed keys of `inner`
    pub fn pick(inner: Arc<dyn Store>, keys: &[&str]) -> Self {
        let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let picked = keys.clone();

        Self::new(
            inner,
            move |state| {
                state
                    .iter()
                    .filter(|(k, _)| picked.contains(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            },
            move |current, synced| {
                let mut next = current.clone();
                for key in &keys {
                    match synced.get(key) {
                        Some(value) => {
                            next.insert(key.clone(), value.clone());
                        }
                        None => {
                            next.remove(key);
                        }
                    }
                }
                next
            },
        )
    }
}

impl Store for MappedStore {
    fn get(&self) -> BaseState {
        (self.select)(&self.inner.get())
    }

    fn set(&self, state: BaseState) {
        let next = (self.merge)(&self.inner.get(), state);
        self.inner.set(next);
    }

    fn state_changes(&self) -> StateStream {
        let select = Arc::clone(&self.select);
        self.inner
            .state_changes()
            .map(move |state| select(&state))
            .boxed()
    }
}
