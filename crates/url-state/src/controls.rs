// crates/url-state/src/controls.rs
//! Immediate and batched URL updates

use crate::history::{HistoryUpdate, MemoryHistory};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

type UrlUpdater = Box<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Default)]
struct UpdateQueue {
    updaters: Vec<UrlUpdater>,
    replace: bool,
}

/// Writes URL changes to a [`MemoryHistory`]
///
/// Updates that produce the current URL are dropped, so rewriting identical
/// state never creates a history entry. [`UrlControls::update_async`] batches
/// every update queued during the same scheduler turn into one entry.
#[derive(Clone)]
pub struct UrlControls {
    history: MemoryHistory,
    queue: Arc<Mutex<UpdateQueue>>,
}

impl UrlControls {
    /// Creates controls over a history
    pub fn new(history: MemoryHistory) -> Self {
        Self {
            history,
            queue: Arc::new(Mutex::new(UpdateQueue::default())),
        }
    }

    /// The underlying history
    pub fn history(&self) -> &MemoryHistory {
        &self.history
    }

    /// Returns the current URL
    pub fn get_url(&self) -> String {
        self.history.location()
    }

    /// Subscribes to URL changes
    pub fn listen(&self) -> broadcast::Receiver<HistoryUpdate> {
        self.history.listen()
    }

    /// Applies an update right away
    ///
    /// Returns the new URL, or `None` if the update left the URL unchanged.
    pub fn update<F>(&self, updater: F, replace: bool) -> Option<String>
    where
        F: FnOnce(&str) -> String,
    {
        let current = self.history.location();
        let next = updater(&current);
        self.commit(&current, next, replace)
    }

    /// Queues an update and flushes the queue after yielding once
    ///
    /// Updates queued by other tasks in the meantime land in the same history
    /// entry, which replaces the current one only if every queued update asked
    /// for replace. Returns the URL written by this flush, or `None` if nothing
    /// changed or another caller already flushed the batch.
    pub async fn update_async<F>(&self, updater: F, replace: bool) -> Option<String>
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        {
            let mut queue = self.lock_queue();
            queue.replace = if queue.updaters.is_empty() {
                replace
            } else {
                queue.replace && replace
            };
            queue.updaters.push(Box::new(updater));
        }

        tokio::task::yield_now().await;
        self.flush()
    }

    /// Applies every queued update now
    pub fn flush(&self) -> Option<String> {
        let (updaters, replace) = {
            let mut queue = self.lock_queue();
            let replace = queue.replace;
            (std::mem::take(&mut queue.updaters), replace)
        };

        if updaters.is_empty() {
            return None;
        }

        let current = self.history.location();
        let next = apply_all(&updaters, &current);
        self.commit(&current, next, replace)
    }

    /// Drops every queued update
    pub fn cancel(&self) {
        self.lock_queue().updaters.clear();
    }

    /// The URL a flush would produce, if any updates are queued
    pub fn pending_url(&self) -> Option<String> {
        let queue = self.lock_queue();
        if queue.updaters.is_empty() {
            return None;
        }
        Some(apply_all(&queue.updaters, &self.history.location()))
    }

    fn commit(&self, current: &str, next: String, replace: bool) -> Option<String> {
        if next == current {
            return None;
        }

        if replace {
            self.history.replace(next.clone());
        } else {
            self.history.push(next.clone());
        }
        Some(next)
    }

    fn lock_queue(&self) -> MutexGuard<'_, UpdateQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for UrlControls {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlControls")
            .field("history", &self.history)
            .field("queued", &self.lock_queue().updaters.len())
            .finish()
    }
}

fn apply_all(updaters: &[UrlUpdater], start: &str) -> String {
    updaters
        .iter()
        .fold(start.to_string(), |url, updater| updater(&url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls(initial: &str) -> UrlControls {
        UrlControls::new(MemoryHistory::new(initial))
    }

    #[test]
    fn test_update_pushes() {
        let controls = controls("/a");
        let url = controls.update(|_| "/b".to_string(), false);
        assert_eq!(url.as_deref(), Some("/b"));
        assert_eq!(controls.history().len(), 2);
    }

    #[test]
    fn test_update_replaces() {
        let controls = controls("/a");
        controls.update(|_| "/b".to_string(), true);
        assert_eq!(controls.history().entries(), vec!["/b"]);
    }

    #[test]
    fn test_unchanged_url_is_not_written() {
        let controls = controls("/a");
        let mut rx = controls.listen();
        assert!(controls.update(|url| url.to_string(), false).is_none());
        assert_eq!(controls.history().len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_cancel_drops_queue() {
        let controls = controls("/a");
        controls.lock_queue().updaters.push(Box::new(|_| "/b".to_string()));
        assert_eq!(controls.pending_url().as_deref(), Some("/b"));
        controls.cancel();
        assert!(controls.pending_url().is_none());
        assert!(controls.flush().is_none());
        assert_eq!(controls.get_url(), "/a");
    }

    #[tokio::test]
    async fn test_update_async_applies() {
        let controls = controls("/a");
        let url = controls
            .update_async(|url| format!("{}?x=1", url), false)
            .await;
        assert_eq!(url.as_deref(), Some("/a?x=1"));
        assert_eq!(controls.get_url(), "/a?x=1");
    }

    #[tokio::test]
    async fn test_update_async_batches_into_one_entry() {
        let controls = controls("/a");
        let first = controls.clone();
        let second = controls.clone();

        let (one, two) = tokio::join!(
            first.update_async(|url| format!("{}?x=1", url), true),
            second.update_async(|url| format!("{}&y=2", url), false),
        );

        // exactly one of the callers performs the flush
        assert!(one.is_some() ^ two.is_some());
        assert_eq!(controls.get_url(), "/a?x=1&y=2");
        // one push, because not every queued update asked for replace
        assert_eq!(controls.history().entries(), vec!["/a", "/a?x=1&y=2"]);
    }
}
