use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A type-erased, reference-counted state value.
///
/// Wraps `Arc<dyn Any + Send + Sync>` so snapshots can share values without
/// copying them. Clone is an atomic increment. The concrete type name is kept
/// for diagnostics (`TypeMismatch` errors and `Debug` output).
#[derive(Clone)]
pub struct StateValue {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl StateValue {
    /// Create a new StateValue from any `Send + Sync` type.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Try to downcast to a concrete type reference.
    ///
    /// Returns `None` if the stored type doesn't match `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Downcast and clone the stored value out.
    pub fn downcast_cloned<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Name of the stored type, as reported by `std::any::type_name`.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True when both handles point at the same allocation.
    ///
    /// The store uses this to detect which paths a reducer touched.
    pub fn ptr_eq(&self, other: &StateValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Get the number of strong references to the underlying value.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl fmt::Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateValue")
            .field("type", &self.type_name)
            .finish()
    }
}

/// Unique handle for a subscription registered on a store or subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_and_downcast_correct_type() {
        let v = StateValue::new(42u32);
        assert_eq!(v.downcast_ref::<u32>(), Some(&42u32));
    }

    #[test]
    fn downcast_wrong_type_returns_none() {
        let v = StateValue::new(42u32);
        assert_eq!(v.downcast_ref::<i32>(), None);
        assert_eq!(v.downcast_ref::<String>(), None);
        assert!(v.downcast_cloned::<bool>().is_none());
    }

    #[test]
    fn downcast_cloned_copies_out() {
        let v = StateValue::new(vec!["a".to_string(), "b".to_string()]);
        let cloned: Vec<String> = v.downcast_cloned().unwrap();
        assert_eq!(cloned, vec!["a", "b"]);
    }

    #[test]
    fn string_is_not_str() {
        let v = StateValue::new("hello".to_string());
        assert!(v.downcast_ref::<&str>().is_none());
        assert_eq!(v.type_name(), "alloc::string::String");
    }

    #[test]
    fn type_name_is_recorded() {
        let v = StateValue::new(7u8);
        assert_eq!(v.type_name(), "u8");
        assert!(format!("{:?}", v).contains("u8"));
    }

    #[test]
    fn clones_share_allocation() {
        let v1 = StateValue::new(vec![0u8; 1024]);
        let v2 = v1.clone();
        assert!(v1.ptr_eq(&v2));
        assert_eq!(v1.ref_count(), 2);

        let v3 = StateValue::new(vec![0u8; 1024]);
        assert!(!v1.ptr_eq(&v3));
    }
}
