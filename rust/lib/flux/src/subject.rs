use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::subscription::Subscription;
use crate::value::SubscriptionId;

type ObserverFn<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// A multicast event source with synchronous observers.
///
/// Two flavors:
/// - `Subject::new()`: publish only; late subscribers see future values.
/// - `Subject::replay(initial)`: keeps the latest value and hands it to
///   every new subscriber immediately (replay-one).
///
/// Clones share the same observers and latest value.
pub struct Subject<T> {
    inner: Arc<SubjectInner<T>>,
}

struct SubjectInner<T> {
    latest: RwLock<Option<T>>,
    replay: bool,
    observers: RwLock<Vec<(SubscriptionId, ObserverFn<T>)>>,
    next_id: AtomicU64,
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Subject<T> {
    pub fn new() -> Self {
        Self::build(None, false)
    }

    pub fn replay(initial: T) -> Self {
        Self::build(Some(initial), true)
    }

    fn build(latest: Option<T>, replay: bool) -> Self {
        Self {
            inner: Arc::new(SubjectInner {
                latest: RwLock::new(latest),
                replay,
                observers: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Push a value to every observer, in subscription order.
    pub fn next(&self, value: T) {
        if self.inner.replay {
            *self
                .inner
                .latest
                .write()
                .unwrap_or_else(PoisonError::into_inner) = Some(value.clone());
        }
        let observers: Vec<ObserverFn<T>> = self
            .inner
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in observers {
            observer(&value);
        }
    }

    /// Latest value of a replay subject; always `None` for a publish subject.
    pub fn value(&self) -> Option<T> {
        self.inner
            .latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let observer: ObserverFn<T> = Arc::new(observer);
        self.inner
            .observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::clone(&observer)));

        if let Some(latest) = self.value() {
            observer(&latest);
        }

        let inner = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner
                    .observers
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .retain(|(observer_id, _)| *observer_id != id);
            }
        })
    }

    pub fn observer_count(&self) -> usize {
        self.inner
            .observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// A write handle feeding this subject.
    pub fn sink(&self) -> Sink<T> {
        let subject = self.clone();
        Sink::new(move |value| subject.next(value))
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("replay", &self.inner.replay)
            .finish()
    }
}

/// A clonable write handle: the "trigger" a field is written through.
///
/// What a send does depends on who built the sink: a subject sink pushes to
/// the subject, a dispatch sink turns the value into an action.
pub struct Sink<T> {
    send: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T> Clone for Sink<T> {
    fn clone(&self) -> Self {
        Self {
            send: Arc::clone(&self.send),
        }
    }
}

impl<T: 'static> Sink<T> {
    pub fn new<F>(send: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            send: Arc::new(send),
        }
    }

    pub fn send(&self, value: T) {
        (self.send)(value)
    }

    /// A sink of `U` that converts each value with `f` before forwarding.
    pub fn contramap<U, F>(&self, f: F) -> Sink<U>
    where
        U: 'static,
        F: Fn(U) -> T + Send + Sync + 'static,
    {
        let inner = self.clone();
        Sink::new(move |value| inner.send(f(value)))
    }
}

impl<T> fmt::Debug for Sink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sink")
    }
}
