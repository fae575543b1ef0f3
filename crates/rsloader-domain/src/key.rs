//! Identifiers and the ordered, duplicate-free identifier set.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An identifier that can be resolved by a batch function.
///
/// `key_id` must be unique per logical record: two keys with the same id are
/// treated as the same key and only one of them reaches the resolver. Records
/// that should be distinct but share an id will overwrite each other in the
/// result map.
pub trait Key: Clone + fmt::Debug + Send + Sync + 'static {
    /// The value handed to the resolver.
    type Raw: Clone + Send + Sync;

    /// Canonical string identity, used to index results.
    fn key_id(&self) -> String;

    /// The original value of the key.
    fn raw(&self) -> Self::Raw;
}

/// A key whose identity is the string itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StringKey(String);

impl StringKey {
    /// Creates a new string key.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StringKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StringKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for StringKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Key for StringKey {
    type Raw = String;

    fn key_id(&self) -> String {
        self.0.clone()
    }

    fn raw(&self) -> String {
        self.0.clone()
    }
}

macro_rules! impl_integer_key {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Key for $ty {
                type Raw = $ty;

                fn key_id(&self) -> String {
                    self.to_string()
                }

                fn raw(&self) -> $ty {
                    *self
                }
            }
        )*
    };
}

impl_integer_key!(i32, i64, u32, u64, usize);

/// Insertion-ordered, duplicate-free set of keys with a target capacity.
///
/// The capacity is the number of keys the owner expects to collect; it is
/// reported by [`Keys::capacity`] regardless of how much memory the backing
/// vector actually reserved.
#[derive(Debug, Clone)]
pub struct Keys<K> {
    keys: Vec<K>,
    ids: HashSet<String>,
    capacity: usize,
}

impl<K: Key> Keys<K> {
    /// Creates an empty set sized for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            keys: Vec::with_capacity(capacity),
            ids: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Creates a set holding the given keys, deduplicated.
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let mut set = Self::with_capacity(0);
        set.append(keys);
        set.capacity = set.keys.len();
        set
    }

    /// Appends keys in order, skipping `None` entries and duplicates.
    ///
    /// Accepts plain keys or `Option<K>`, so callers holding optional
    /// identifiers can pass them through without filtering first.
    pub fn append<I, T>(&mut self, keys: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<K>>,
    {
        for key in keys.into_iter().filter_map(Into::into) {
            if self.ids.insert(key.key_id()) {
                self.keys.push(key);
            }
        }
    }

    /// Returns true if a key with the same id is already present.
    pub fn contains(&self, key: &K) -> bool {
        self.ids.contains(&key.key_id())
    }

    /// The target capacity this set was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Removes every key, keeping the target capacity.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.ids.clear();
    }

    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.keys.iter()
    }

    /// Returns the keys as a slice, in insertion order.
    pub fn as_slice(&self) -> &[K] {
        &self.keys
    }

    /// Returns the raw value of every key, in insertion order.
    pub fn raw_keys(&self) -> Vec<K::Raw> {
        self.keys.iter().map(K::raw).collect()
    }

    /// Returns the canonical id of every key, in insertion order.
    pub fn string_keys(&self) -> Vec<String> {
        self.keys.iter().map(K::key_id).collect()
    }
}

impl<K: Key> Default for Keys<K> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<'a, K> IntoIterator for &'a Keys<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
