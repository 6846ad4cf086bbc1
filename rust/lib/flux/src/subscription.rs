use std::fmt;

/// Handle that releases a registration when dropped.
///
/// Returned by `StateStore::observe`, `Subject::subscribe` and everything
/// built on them. Keep it alive for as long as the callback should fire.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + Sync + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A subscription with nothing to release.
    pub fn empty() -> Self {
        Self { release: None }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }

    /// Release now instead of on drop.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// A group of subscriptions released together.
#[derive(Debug, Default)]
pub struct SubscriptionBag {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn append(&mut self, other: &mut SubscriptionBag) {
        self.subscriptions.append(&mut other.subscriptions);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release every subscription, most recent first.
    pub fn dispose(&mut self) {
        while let Some(subscription) = self.subscriptions.pop() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn counting(counter: &Arc<AtomicU64>) -> Subscription {
        let counter = counter.clone();
        Subscription::new(move || {
            counter.fetch_add(1, Ordering::Relaxed);
        })
    }

    #[test]
    fn drop_releases_once() {
        let released = Arc::new(AtomicU64::new(0));
        {
            let sub = counting(&released);
            assert!(sub.is_active());
        }
        assert_eq!(released.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn explicit_unsubscribe_releases_once() {
        let released = Arc::new(AtomicU64::new(0));
        let sub = counting(&released);
        sub.unsubscribe();
        assert_eq!(released.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn empty_subscription_is_inactive() {
        let sub = Subscription::empty();
        assert!(!sub.is_active());
        drop(sub);
    }

    #[test]
    fn bag_disposes_everything() {
        let released = Arc::new(AtomicU64::new(0));
        let mut bag = SubscriptionBag::new();
        bag.push(counting(&released));
        bag.push(counting(&released));

        let mut other = SubscriptionBag::new();
        other.push(counting(&released));
        bag.append(&mut other);

        assert_eq!(bag.len(), 3);
        assert!(other.is_empty());

        bag.dispose();
        assert!(bag.is_empty());
        assert_eq!(released.load(Ordering::Relaxed), 3);
    }
}
