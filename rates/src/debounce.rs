//! Keyed debounce scheduler.
//!
//! Coalesces bursts of triggers for the same key into a single dispatch
//! after a quiet period. The scheduler is payload-agnostic: it only knows
//! "run this task once the key has been quiet for the window".

use std::future::Future;
use std::hash::Hash;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;

/// Per-key quiet-period scheduler.
///
/// Rescheduling a key cancels its pending timer outright; the superseded
/// task is never dispatched. Distinct keys never interfere.
pub struct Debouncer<K> {
    pending: DashMap<K, JoinHandle<()>>,
    window: Duration,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Create a scheduler with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            window,
        }
    }

    /// Get the quiet window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule `task` to run after the quiet window, superseding any
    /// pending schedule for the same key.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule<F>(&self, key: K, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            task.await;
        });

        if let Some(superseded) = self.pending.insert(key, handle) {
            superseded.abort();
        }
    }

    /// Cancel the pending schedule for a key, if any.
    pub fn cancel(&self, key: &K) {
        if let Some((_, handle)) = self.pending.remove(key) {
            handle.abort();
        }
    }

    /// Number of schedules that have not fired yet.
    pub fn pending_count(&self) -> usize {
        self.pending
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const WINDOW: Duration = Duration::from_millis(25);
    const SETTLE: Duration = Duration::from_millis(120);

    #[tokio::test]
    async fn test_burst_dispatches_once_with_latest() {
        let debouncer = Debouncer::new(WINDOW);
        let fired = Arc::new(Mutex::new(Vec::new()));

        for payload in [1u32, 2, 3] {
            let fired = Arc::clone(&fired);
            debouncer.schedule("usd", async move {
                fired.lock().unwrap().push(payload);
            });
        }

        tokio::time::sleep(SETTLE).await;

        assert_eq!(*fired.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let debouncer = Debouncer::new(WINDOW);
        let count = Arc::new(AtomicUsize::new(0));

        for key in ["usd", "eur"] {
            let count = Arc::clone(&count);
            debouncer.schedule(key, async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(SETTLE).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancel_discards_pending_task() {
        let debouncer = Debouncer::new(WINDOW);
        let count = Arc::new(AtomicUsize::new(0));

        {
            let count = Arc::clone(&count);
            debouncer.schedule("usd", async move {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        debouncer.cancel(&"usd");

        tokio::time::sleep(SETTLE).await;

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pending_count_drains_after_fire() {
        let debouncer = Debouncer::new(WINDOW);

        debouncer.schedule("usd", async {});
        assert_eq!(debouncer.pending_count(), 1);

        tokio::time::sleep(SETTLE).await;

        assert_eq!(debouncer.pending_count(), 0);
    }
}
