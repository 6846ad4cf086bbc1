use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;
use tracing::trace;

use crate::path::{DEFAULT_SEPARATOR, StatePath};
use crate::state::State;
use crate::subscription::Subscription;
use crate::trie::Trie;
use crate::value::{StateValue, SubscriptionId};

/// Callback type for state change notifications.
///
/// Receives the changed path and the snapshot current at notification time.
pub type ChangeHandler = Arc<dyn Fn(&str, &State) + Send + Sync>;

/// Shared state tree with Trie-based change notification.
///
/// - `reduce(f)` replaces the snapshot with `f(current)` and notifies every
///   subscriber whose pattern matches a changed path.
/// - `snapshot()` reads the current tree (Arc clone, cheap).
/// - `subscribe(pattern, handler)` / `observe(pattern, handler)` register
///   change handlers.
/// - `state_stream()` yields snapshots to async consumers.
///
/// Handlers run synchronously on the writing thread with no lock held, so a
/// handler may write again. Such cascaded writes are committed to the
/// snapshot stream together with the write that caused them: the stream is
/// published once, when the outermost `reduce` returns.
pub struct StateStore {
    current: RwLock<State>,
    handlers: Trie<HandlerEntry>,
    next_id: AtomicU64,
    depth: AtomicUsize,
    dirty: AtomicBool,
    snapshots: watch::Sender<State>,
}

#[derive(Clone)]
struct HandlerEntry {
    id: SubscriptionId,
    handler: ChangeHandler,
}

impl StateStore {
    /// Create an empty store using the `.` separator.
    pub fn new() -> Self {
        Self::with_separator(DEFAULT_SEPARATOR)
    }

    pub fn with_separator(separator: char) -> Self {
        let (snapshots, _) = watch::channel(State::new());
        Self {
            current: RwLock::new(State::new()),
            handlers: Trie::with_separator(separator),
            next_id: AtomicU64::new(1),
            depth: AtomicUsize::new(0),
            dirty: AtomicBool::new(false),
            snapshots,
        }
    }

    pub fn separator(&self) -> char {
        self.handlers.separator()
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> State {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The current value at `path`.
    pub fn get(&self, path: &str) -> Option<StateValue> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Apply a pure reducer to the current snapshot.
    ///
    /// The reducer runs under the write lock and must not touch the store.
    pub fn reduce<F>(&self, reducer: F)
    where
        F: FnOnce(&State) -> State,
    {
        let _commit = Commit::enter(self);
        let changed = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            let next = reducer(&current);
            let changed = current.changed_paths(&next);
            *current = next;
            changed
        };

        if changed.is_empty() {
            return;
        }
        self.dirty.store(true, Ordering::SeqCst);
        trace!(changed = changed.len(), "state reduced");

        for path in &changed {
            for entry in self.handlers.match_path(path) {
                let state = self.snapshot();
                (entry.handler)(path, &state);
            }
        }
    }

    /// Store a typed value at `path`.
    pub fn set<T: std::any::Any + Send + Sync>(&self, path: &StatePath, value: T) {
        self.reduce(|state| state.updating(path, Some(value)));
    }

    /// Remove the value at `path`.
    pub fn clear(&self, path: &StatePath) {
        self.reduce(|state| state.updating_value(path, None));
    }

    /// Subscribe to changes matching the given Trie pattern.
    ///
    /// Returns a `SubscriptionId` for `unsubscribe`.
    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&str, &State) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = HandlerEntry {
            id,
            handler: Arc::new(handler),
        };
        self.handlers.insert(pattern, entry);
        id
    }

    /// Unsubscribe a handler by its ID and the pattern it was registered with.
    pub fn unsubscribe(&self, pattern: &str, id: SubscriptionId) {
        self.handlers.remove(pattern, |entry| entry.id == id);
    }

    /// Number of registered change handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Subscribe and get a handle that unsubscribes on drop.
    ///
    /// The handle holds the store weakly.
    pub fn observe<F>(self: &Arc<Self>, pattern: &str, handler: F) -> Subscription
    where
        F: Fn(&str, &State) + Send + Sync + 'static,
    {
        let id = self.subscribe(pattern, handler);
        let store = Arc::downgrade(self);
        let pattern = pattern.to_string();
        Subscription::new(move || {
            if let Some(store) = store.upgrade() {
                store.unsubscribe(&pattern, id);
            }
        })
    }

    /// Snapshot stream for async consumers.
    ///
    /// The receiver starts at the current snapshot and sees one update per
    /// outermost commit that changed something.
    pub fn state_stream(&self) -> watch::Receiver<State> {
        self.snapshots.subscribe()
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.snapshot());
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks reduce nesting; the outermost commit publishes on drop.
struct Commit<'a> {
    store: &'a StateStore,
}

impl<'a> Commit<'a> {
    fn enter(store: &'a StateStore) -> Self {
        store.depth.fetch_add(1, Ordering::SeqCst);
        Self { store }
    }
}

impl Drop for Commit<'_> {
    fn drop(&mut self) {
        if self.store.depth.fetch_sub(1, Ordering::SeqCst) == 1
            && self.store.dirty.swap(false, Ordering::SeqCst)
        {
            self.store.publish();
        }
    }
}

/// A pluggable store backend.
///
/// Both the dispatch store and the stream store expose the same shared
/// `StateStore` for reads; they differ only in how writes reach it.
pub trait Store: Send + Sync {
    fn state_store(&self) -> &Arc<StateStore>;

    fn snapshot(&self) -> State {
        self.state_store().snapshot()
    }

    fn state_stream(&self) -> watch::Receiver<State> {
        self.state_store().state_stream()
    }
}
