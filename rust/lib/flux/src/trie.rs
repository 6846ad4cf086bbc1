use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::path::DEFAULT_SEPARATOR;

/// A thread-safe Trie for wildcard path pattern matching.
///
/// Supports wildcards:
/// - `+` matches exactly one path segment
/// - `#` matches any number of remaining segments, including none (must be
///   the last segment)
///
/// Patterns and paths share the separator the trie was built with
/// (`.` by default).
///
/// # Examples
///
/// ```ignore
/// let trie = Trie::new();
/// trie.insert("phoneinput.a.number", 1);
/// trie.insert("phoneinput.+.number", 2);
/// trie.insert("phoneinput.a.#", 3);
///
/// let results = trie.match_path("phoneinput.a.number"); // [1, 2, 3]
/// ```
pub struct Trie<T> {
    root: RwLock<Node<T>>,
    separator: char,
}

struct Node<T> {
    literal: HashMap<String, Node<T>>,
    /// `+` child.
    any_one: Option<Box<Node<T>>>,
    /// Values of patterns ending in `#` at this level.
    rest: Vec<T>,
    /// Values of patterns ending exactly here.
    here: Vec<T>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            literal: HashMap::new(),
            any_one: None,
            rest: Vec::new(),
            here: Vec::new(),
        }
    }
}

impl<T: Clone> Trie<T> {
    /// Create an empty trie using the default `.` separator.
    pub fn new() -> Self {
        Self::with_separator(DEFAULT_SEPARATOR)
    }

    pub fn with_separator(separator: char) -> Self {
        Self {
            root: RwLock::new(Node::default()),
            separator,
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Insert a value at the given pattern.
    pub fn insert(&self, pattern: &str, value: T) {
        let segments = self.split(pattern);
        self.write().insert(&segments, value);
    }

    /// Return all values whose patterns match the given concrete path.
    ///
    /// `phoneinput.a.number` matches `phoneinput.a.number`,
    /// `phoneinput.+.number`, `phoneinput.a.#`, `phoneinput.#` and `#`.
    pub fn match_path(&self, path: &str) -> Vec<T> {
        let segments = self.split(path);
        let mut found = Vec::new();
        self.read().collect(&segments, &mut found);
        found
    }

    /// Remove the values stored at `pattern` for which `predicate` holds.
    /// Branches left empty are pruned.
    ///
    /// Returns `true` if any value was removed.
    pub fn remove<F>(&self, pattern: &str, predicate: F) -> bool
    where
        F: Fn(&T) -> bool,
    {
        let segments = self.split(pattern);
        self.write().remove(&segments, &predicate)
    }

    /// Number of stored values across all patterns.
    pub fn len(&self) -> usize {
        self.read().count()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn split<'a>(&self, raw: &'a str) -> Vec<&'a str> {
        raw.split(self.separator).collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, Node<T>> {
        self.root.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Node<T>> {
        self.root.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for Trie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Node<T> {
    fn insert(&mut self, segments: &[&str], value: T) {
        match segments {
            [] => self.here.push(value),
            ["#", ..] => self.rest.push(value),
            ["+", tail @ ..] => self
                .any_one
                .get_or_insert_with(Box::default)
                .insert(tail, value),
            [segment, tail @ ..] => self
                .literal
                .entry((*segment).to_string())
                .or_default()
                .insert(tail, value),
        }
    }

    fn collect(&self, segments: &[&str], found: &mut Vec<T>) {
        // `#` matches zero or more remaining segments.
        found.extend(self.rest.iter().cloned());
        let Some((segment, tail)) = segments.split_first() else {
            found.extend(self.here.iter().cloned());
            return;
        };
        if let Some(child) = self.literal.get(*segment) {
            child.collect(tail, found);
        }
        if let Some(child) = &self.any_one {
            child.collect(tail, found);
        }
    }

    fn remove<F>(&mut self, segments: &[&str], predicate: &F) -> bool
    where
        F: Fn(&T) -> bool,
    {
        match segments {
            [] => retain_unmatched(&mut self.here, predicate),
            ["#", ..] => retain_unmatched(&mut self.rest, predicate),
            ["+", tail @ ..] => {
                let Some(child) = self.any_one.as_mut() else {
                    return false;
                };
                let removed = child.remove(tail, predicate);
                if child.is_empty() {
                    self.any_one = None;
                }
                removed
            }
            [segment, tail @ ..] => {
                let Some(child) = self.literal.get_mut(*segment) else {
                    return false;
                };
                let removed = child.remove(tail, predicate);
                if child.is_empty() {
                    self.literal.remove(*segment);
                }
                removed
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.here.is_empty() && self.rest.is_empty() && self.any_one.is_none() && self.literal.is_empty()
    }

    fn count(&self) -> usize {
        self.here.len()
            + self.rest.len()
            + self.any_one.as_ref().map_or(0, |child| child.count())
            + self.literal.values().map(Node::count).sum::<usize>()
    }
}

fn retain_unmatched<T, F: Fn(&T) -> bool>(values: &mut Vec<T>, predicate: &F) -> bool {
    let before = values.len();
    values.retain(|v| !predicate(v));
    values.len() < before
}
