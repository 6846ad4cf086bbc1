use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::StateError;
use crate::path::StatePath;
use crate::value::StateValue;

/// An immutable snapshot of the state tree.
///
/// The tree is stored flat, keyed by full path; nesting is expressed through
/// path prefixes (`substate`). Cloning a `State` is an `Arc` clone, and
/// `updating_value` copies only the index, never the values, so reducers can
/// stay pure functions of `(old state, input) -> new state`.
#[derive(Clone, Default)]
pub struct State {
    values: Arc<BTreeMap<String, StateValue>>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&StateValue> {
        self.values.get(path)
    }

    /// The value at `path`, or `NotFound`.
    pub fn value_at(&self, path: &str) -> Result<&StateValue, StateError> {
        self.values
            .get(path)
            .ok_or_else(|| StateError::NotFound(path.to_string()))
    }

    /// Clone the value at `path` out as a `T`.
    ///
    /// `NotFound` when absent, `TypeMismatch` when a value of another type is
    /// stored there.
    pub fn typed_at<T: Any + Clone>(&self, path: &str) -> Result<T, StateError> {
        let value = self.value_at(path)?;
        value
            .downcast_cloned::<T>()
            .ok_or_else(|| StateError::TypeMismatch {
                path: path.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    pub fn string_at(&self, path: &str) -> Result<String, StateError> {
        self.typed_at::<String>(path)
    }

    /// A new snapshot with `value` stored at `path`; `None` removes the entry.
    pub fn updating_value(&self, path: &StatePath, value: Option<StateValue>) -> State {
        let mut next = self.clone();
        let values = Arc::make_mut(&mut next.values);
        match value {
            Some(value) => {
                values.insert(path.as_str().to_string(), value);
            }
            None => {
                values.remove(path.as_str());
            }
        }
        next
    }

    /// Typed convenience over `updating_value`.
    pub fn updating<T: Any + Send + Sync>(&self, path: &StatePath, value: Option<T>) -> State {
        self.updating_value(path, value.map(StateValue::new))
    }

    /// The subtree under `prefix`, with the prefix stripped from every key.
    ///
    /// `phoneinput.a.number` in the full tree becomes `number` in
    /// `substate(phoneinput.a)`.
    pub fn substate(&self, prefix: &StatePath) -> State {
        let scan_prefix = format!("{}{}", prefix.as_str(), prefix.separator());
        let values = self
            .scan(prefix)
            .into_iter()
            .filter_map(|(key, value)| {
                let relative = key.strip_prefix(scan_prefix.as_str())?.to_string();
                Some((relative, value))
            })
            .collect();
        State {
            values: Arc::new(values),
        }
    }

    /// All entries strictly below `prefix`, ordered by path.
    pub fn scan(&self, prefix: &StatePath) -> Vec<(String, StateValue)> {
        let scan_prefix = format!("{}{}", prefix.as_str(), prefix.separator());
        self.values
            .range(scan_prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&scan_prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.values.contains_key(path)
    }

    pub fn paths(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when both snapshots share the same index.
    pub fn ptr_eq(&self, other: &State) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }

    /// Paths whose value was added, removed or replaced between `self` and
    /// `next`. Replacement is detected by identity, not equality.
    pub(crate) fn changed_paths(&self, next: &State) -> Vec<String> {
        if self.ptr_eq(next) {
            return Vec::new();
        }
        let mut changed: Vec<String> = self
            .values
            .iter()
            .filter(|(k, v)| !next.values.get(*k).is_some_and(|n| n.ptr_eq(v)))
            .map(|(k, _)| k.clone())
            .collect();
        changed.extend(
            next.values
                .keys()
                .filter(|k| !self.values.contains_key(*k))
                .cloned(),
        );
        changed
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}
