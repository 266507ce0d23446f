// crates/url-state/src/history.rs
//! In-memory navigation history

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

/// Default number of unread notifications a listener may fall behind
const DEFAULT_LISTENER_CAPACITY: usize = 64;

/// How the current location changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    /// A new entry was added
    Push,
    /// The current entry was overwritten
    Replace,
    /// The user moved back or forward
    Pop,
}

/// Notification sent to listeners after every navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryUpdate {
    /// The new current location
    pub location: String,
    /// Kind of navigation
    pub action: HistoryAction,
}

struct HistoryState {
    entries: Vec<String>,
    index: usize,
}

/// A history stack shared by everything that reads or writes the URL
///
/// Clones share the same stack and listeners. This stands in for the
/// browser's location and history in a host runtime and in tests.
#[derive(Clone)]
pub struct MemoryHistory {
    state: Arc<Mutex<HistoryState>>,
    notifier: broadcast::Sender<HistoryUpdate>,
}

impl MemoryHistory {
    /// Creates a history with a single entry
    pub fn new(initial: impl Into<String>) -> Self {
        Self::with_listener_capacity(initial, DEFAULT_LISTENER_CAPACITY)
    }

    /// Creates a history whose listeners buffer up to `capacity` notifications
    pub fn with_listener_capacity(initial: impl Into<String>, capacity: usize) -> Self {
        let (notifier, _) = broadcast::channel(capacity.max(1));
        Self {
            state: Arc::new(Mutex::new(HistoryState {
                entries: vec![initial.into()],
                index: 0,
            })),
            notifier,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the current location
    pub fn location(&self) -> String {
        let state = self.lock();
        state.entries[state.index].clone()
    }

    /// Adds a new entry, discarding any forward entries
    pub fn push(&self, location: impl Into<String>) {
        let location = location.into();
        {
            let mut state = self.lock();
            let next = state.index + 1;
            state.entries.truncate(next);
            state.entries.push(location.clone());
            state.index = next;
        }
        log::trace!("history push: {}", location);
        self.notify(location, HistoryAction::Push);
    }

    /// Overwrites the current entry
    pub fn replace(&self, location: impl Into<String>) {
        let location = location.into();
        {
            let mut state = self.lock();
            let index = state.index;
            state.entries[index] = location.clone();
        }
        log::trace!("history replace: {}", location);
        self.notify(location, HistoryAction::Replace);
    }

    /// Moves `delta` entries back (negative) or forward (positive)
    ///
    /// Returns false and does nothing if the target is out of range.
    pub fn go(&self, delta: isize) -> bool {
        let location = {
            let mut state = self.lock();
            let target = state.index as isize + delta;
            if delta == 0 || target < 0 || target >= state.entries.len() as isize {
                return false;
            }
            state.index = target as usize;
            state.entries[state.index].clone()
        };
        self.notify(location, HistoryAction::Pop);
        true
    }

    /// Moves one entry back
    pub fn back(&self) -> bool {
        self.go(-1)
    }

    /// Moves one entry forward
    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Number of entries in the stack
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// A history always holds at least its initial entry
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Position of the current entry
    pub fn index(&self) -> usize {
        self.lock().index
    }

    /// Snapshot of every entry, oldest first
    pub fn entries(&self) -> Vec<String> {
        self.lock().entries.clone()
    }

    /// Subscribes to future navigations; past ones are not replayed
    pub fn listen(&self) -> broadcast::Receiver<HistoryUpdate> {
        self.notifier.subscribe()
    }

    fn notify(&self, location: String, action: HistoryAction) {
        // no listeners is fine
        let _ = self.notifier.send(HistoryUpdate { location, action });
    }
}

impl std::fmt::Debug for MemoryHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("MemoryHistory")
            .field("entries", &state.entries)
            .field("index", &state.index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_location() {
        let history = MemoryHistory::new("http://host/");
        assert_eq!(history.location(), "http://host/");
        assert_eq!(history.len(), 1);
        assert_eq!(history.index(), 0);
    }

    #[test]
    fn test_push_and_replace() {
        let history = MemoryHistory::new("/a");
        history.push("/b");
        history.replace("/c");
        assert_eq!(history.entries(), vec!["/a", "/c"]);
        assert_eq!(history.location(), "/c");
    }

    #[test]
    fn test_back_forward() {
        let history = MemoryHistory::new("/a");
        history.push("/b");
        assert!(history.back());
        assert_eq!(history.location(), "/a");
        assert!(!history.back());
        assert!(history.forward());
        assert_eq!(history.location(), "/b");
        assert!(!history.forward());
    }

    #[test]
    fn test_push_discards_forward_entries() {
        let history = MemoryHistory::new("/a");
        history.push("/b");
        history.push("/c");
        history.go(-2);
        history.push("/d");
        assert_eq!(history.entries(), vec!["/a", "/d"]);
    }

    #[test]
    fn test_listeners_receive_updates() {
        let history = MemoryHistory::new("/a");
        let mut rx = history.listen();

        history.push("/b");
        history.replace("/c");
        history.back();

        assert_eq!(
            rx.try_recv().unwrap(),
            HistoryUpdate {
                location: "/b".to_string(),
                action: HistoryAction::Push
            }
        );
        assert_eq!(rx.try_recv().unwrap().action, HistoryAction::Replace);
        let pop = rx.try_recv().unwrap();
        assert_eq!(pop.action, HistoryAction::Pop);
        assert_eq!(pop.location, "/a");
    }

    #[test]
    fn test_listeners_do_not_replay() {
        let history = MemoryHistory::new("/a");
        history.push("/b");
        let mut rx = history.listen();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_clones_share_stack() {
        let history = MemoryHistory::new("/a");
        let other = history.clone();
        other.push("/b");
        assert_eq!(history.location(), "/b");
    }
}
