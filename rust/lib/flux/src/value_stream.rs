use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::StateError;
use crate::path::StatePath;
use crate::store::StateStore;
use crate::subscription::Subscription;

/// A typed view of one path in the store.
///
/// Subscribers get the current value on subscribe, then one emission per
/// change to exactly this path. Reading an absent or mistyped value yields
/// the `StateError` instead of a value.
pub struct ValueStream<T> {
    store: Arc<StateStore>,
    path: StatePath,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for ValueStream<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            path: self.path.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Any + Clone + Send + Sync> ValueStream<T> {
    pub fn new(store: Arc<StateStore>, path: StatePath) -> Self {
        Self {
            store,
            path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &StatePath {
        &self.path
    }

    pub fn current(&self) -> Result<T, StateError> {
        self.store.snapshot().typed_at::<T>(self.path.as_str())
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(Result<T, StateError>) + Send + Sync + 'static,
    {
        let observer = Arc::new(observer);
        let on_change = Arc::clone(&observer);
        // Registered before the initial read so no write can slip between.
        let subscription = self.store.observe(self.path.as_str(), move |path, state| {
            on_change(state.typed_at::<T>(path));
        });
        observer(self.current());
        subscription
    }
}

impl<T> std::fmt::Debug for ValueStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueStream")
            .field("path", &self.path.as_str())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn path(raw: &str) -> StatePath {
        StatePath::parse(raw).unwrap()
    }

    #[test]
    fn emits_current_then_changes() {
        let store = Arc::new(StateStore::new());
        store.set(&path("phoneinput.number"), "1".to_string());

        let stream: ValueStream<String> = ValueStream::new(store.clone(), path("phoneinput.number"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_c = seen.clone();
        let _sub = stream.subscribe(move |value| seen_c.lock().unwrap().push(value));

        store.set(&path("phoneinput.number"), "12".to_string());
        store.set(&path("phoneinput.extension"), "9".to_string());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Ok("1".to_string()), Ok("12".to_string())]
        );
    }

    #[test]
    fn absent_value_is_not_found() {
        let store = Arc::new(StateStore::new());
        let stream: ValueStream<String> = ValueStream::new(store, path("phoneinput.number"));
        assert_eq!(
            stream.current(),
            Err(StateError::NotFound("phoneinput.number".to_string()))
        );
    }

    #[test]
    fn dropped_subscription_stops_emitting() {
        let store = Arc::new(StateStore::new());
        let stream: ValueStream<u32> = ValueStream::new(store.clone(), path("a"));
        let seen = Arc::new(Mutex::new(0usize));
        let seen_c = seen.clone();
        let sub = stream.subscribe(move |_| *seen_c.lock().unwrap() += 1);

        store.set(&path("a"), 1u32);
        drop(sub);
        store.set(&path("a"), 2u32);

        assert_eq!(*seen.lock().unwrap(), 2);
    }
}
