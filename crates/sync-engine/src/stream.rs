// crates/sync-engine/src/stream.rs
//! Change detection over state streams

use futures::future;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

/// Suppresses values equal to the last accepted one
///
/// The detector starts from a seed that is never emitted itself, so the
/// first value that differs from the seed is the first one accepted.
pub struct DistinctUntilChanged<T, F> {
    last: T,
    eq: F,
}

impl<T, F> DistinctUntilChanged<T, F>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    /// Creates a detector seeded with `initial`
    pub fn new(initial: T, eq: F) -> Self {
        Self { last: initial, eq }
    }

    /// Returns `next` if it differs from the last accepted value
    pub fn accept(&mut self, next: T) -> Option<T> {
        if (self.eq)(&self.last, &next) {
            return None;
        }
        self.last = next.clone();
        Some(next)
    }

    /// The value new input is compared against
    pub fn last(&self) -> &T {
        &self.last
    }
}

/// Filters a stream through a [`DistinctUntilChanged`] seeded with `initial`
pub fn distinct_until_changed<S, T, F>(source: S, initial: T, eq: F) -> impl Stream<Item = T>
where
    S: Stream<Item = T>,
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let mut detector = DistinctUntilChanged::new(initial, eq);
    source.filter_map(move |item| future::ready(detector.accept(item)))
}

/// Turns a broadcast receiver into a stream of future values
///
/// A receiver that falls behind skips to the oldest value still buffered.
/// The stream ends when every sender is gone.
pub fn broadcast_stream<T>(rx: broadcast::Receiver<T>) -> BoxStream<'static, T>
where
    T: Clone + Send + 'static,
{
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(item) => return Some((item, rx)),
                Err(RecvError::Lagged(skipped)) => {
                    log::warn!("State listener lagged, skipped {} update(s)", skipped);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
    .boxed()
}
