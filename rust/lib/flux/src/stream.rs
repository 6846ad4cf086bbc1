use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::state::State;
use crate::store::{StateStore, Store};
use crate::subject::Subject;
use crate::subscription::{Subscription, SubscriptionBag};

/// Store backend fed directly by subjects.
///
/// Each registered subject gets its own reducer; every value pushed on the
/// subject is folded into the state tree. Registrations live as long as the
/// store.
pub struct StreamStore {
    store: Arc<StateStore>,
    registrations: Mutex<SubscriptionBag>,
    reducers: AtomicUsize,
}

impl StreamStore {
    pub fn new() -> Self {
        Self::with_store(Arc::new(StateStore::new()))
    }

    pub fn with_store(store: Arc<StateStore>) -> Self {
        Self {
            store,
            registrations: Mutex::new(SubscriptionBag::new()),
            reducers: AtomicUsize::new(0),
        }
    }

    /// Fold every value of `subject` into the state with `reducer`.
    ///
    /// A replay subject's current value is reduced immediately.
    pub fn register<T, F>(&self, subject: &Subject<T>, reducer: F)
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&State, &T) -> State + Send + Sync + 'static,
    {
        let store = Arc::downgrade(&self.store);
        let subscription: Subscription = subject.subscribe(move |value| {
            if let Some(store) = store.upgrade() {
                store.reduce(|state| reducer(state, value));
            }
        });
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(subscription);
        self.reducers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reducer_count(&self) -> usize {
        self.reducers.load(Ordering::Relaxed)
    }
}

impl Default for StreamStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for StreamStore {
    fn state_store(&self) -> &Arc<StateStore> {
        &self.store
    }
}

impl std::fmt::Debug for StreamStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamStore")
            .field("reducers", &self.reducer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::StatePath;

    fn number_path() -> StatePath {
        StatePath::parse("phoneinput.number").unwrap()
    }

    #[test]
    fn subject_values_are_reduced() {
        let store = StreamStore::new();
        let subject: Subject<Option<String>> = Subject::replay(None);
        let path = number_path();
        store.register(&subject, move |state, value| {
            state.updating(&path, value.clone())
        });

        assert!(!store.snapshot().contains("phoneinput.number"));
        subject.next(Some("555".to_string()));
        assert_eq!(store.snapshot().string_at("phoneinput.number").unwrap(), "555");

        subject.next(None);
        assert!(!store.snapshot().contains("phoneinput.number"));
        assert_eq!(store.reducer_count(), 1);
    }

    #[test]
    fn replayed_value_is_reduced_on_register() {
        let store = StreamStore::new();
        let subject = Subject::replay(Some(7u32));
        let path = StatePath::parse("seed").unwrap();
        store.register(&subject, move |state, value| state.updating(&path, *value));
        assert_eq!(store.snapshot().typed_at::<u32>("seed").unwrap(), 7);
    }

    #[test]
    fn dropping_store_detaches_reducers() {
        let subject: Subject<Option<u32>> = Subject::replay(None);
        {
            let store = StreamStore::new();
            let path = StatePath::parse("x").unwrap();
            store.register(&subject, move |state, value| state.updating(&path, *value));
            assert_eq!(subject.observer_count(), 1);
        }
        assert_eq!(subject.observer_count(), 0);
        subject.next(Some(1));
    }

    #[tokio::test]
    async fn stream_store_publishes_snapshot() {
        let store = StreamStore::new();
        let subject: Subject<Option<String>> = Subject::replay(None);
        let path = number_path();
        store.register(&subject, move |state, value| state.updating(&path, value.clone()));

        let mut rx = store.state_stream();
        subject.next(Some("1".to_string()));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().string_at("phoneinput.number").unwrap(), "1");
    }
}
