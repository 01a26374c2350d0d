//! Watcher registration shared by every level of the property tree
//! (element, property, device, client). Grounded in the teacher's
//! `Arc<Mutex<..>>`-guarded shared-state convention (`client/state.rs`),
//! generalized here to a fan-out callback registry instead of a single
//! shared `HashMap`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::update::Update;

/// Opaque handle returned by `WatcherRegistry::register`, used to remove a
/// watcher later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherId(u64);

type WatcherFn = dyn Fn(&Update) + Send + Sync;

/// A fan-out list of callbacks invoked with the `Update` that caused a
/// change at this level of the tree.
#[derive(Default)]
pub struct WatcherRegistry {
    next_id: AtomicU64,
    watchers: Vec<(WatcherId, Arc<WatcherFn>)>,
}

impl std::fmt::Debug for WatcherRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherRegistry")
            .field("count", &self.watchers.len())
            .finish()
    }
}

impl WatcherRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            watchers: Vec::new(),
        }
    }

    /// Register a new watcher, returning a handle that can later be passed
    /// to `remove`.
    pub fn register<F>(&mut self, f: F) -> WatcherId
    where
        F: Fn(&Update) + Send + Sync + 'static,
    {
        let id = WatcherId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.watchers.push((id, Arc::new(f)));
        id
    }

    /// Remove a previously registered watcher. No-op if already removed.
    pub fn remove(&mut self, id: WatcherId) {
        self.watchers.retain(|(wid, _)| *wid != id);
    }

    /// Invoke every registered watcher with the given update. A watcher that
    /// panics is caught and logged (spec §4.D: "Watcher exceptions must not
    /// prevent other watchers from firing and must not abort the apply") —
    /// the remaining watchers in the set still run.
    pub fn notify(&self, update: &Update) {
        for (id, f) in &self.watchers {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(update)));
            if let Err(payload) = result {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                tracing::warn!(watcher = ?id, %message, "watcher callback panicked; continuing");
            }
        }
    }

    /// Number of currently registered watchers
    pub fn len(&self) -> usize {
        self.watchers.len()
    }

    /// True if no watchers are registered
    pub fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::GetProperties;
    use std::sync::atomic::AtomicUsize;

    fn sample_update() -> Update {
        Update::GetProperties(GetProperties {
            version: "1.7".to_string(),
            device: None,
            name: None,
        })
    }

    #[test]
    fn test_notify_calls_all_watchers() {
        let mut registry = WatcherRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let c1 = calls.clone();
        registry.register(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = calls.clone();
        registry.register(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify(&sample_update());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_panicking_watcher_does_not_stop_others() {
        let mut registry = WatcherRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));

        registry.register(|_| panic!("boom"));
        let c2 = calls.clone();
        registry.register(move |_| {
            c2.fetch_add(1, Ordering::SeqCst);
        });

        registry.notify(&sample_update());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_watcher() {
        let mut registry = WatcherRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let c1 = calls.clone();
        let id = registry.register(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });

        registry.remove(id);
        registry.notify(&sample_update());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }
}
