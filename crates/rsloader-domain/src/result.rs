//! Per-key results and the result map produced by a resolver invocation.

use std::collections::hash_map;
use std::collections::HashMap;

use crate::error::LoadError;
use crate::key::{Key, Keys};

/// The value/error pair for a single key.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadResult<V> {
    /// The resolved value, if any.
    pub value: Option<V>,
    /// The per-key error, if resolution failed.
    pub error: Option<LoadError>,
}

impl<V> LoadResult<V> {
    /// A successfully resolved value.
    pub fn ok(value: V) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    /// A result holding neither a value nor an error.
    pub fn empty() -> Self {
        Self {
            value: None,
            error: None,
        }
    }

    /// A failed resolution.
    pub fn err(error: LoadError) -> Self {
        Self {
            value: None,
            error: Some(error),
        }
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

impl<V> Default for LoadResult<V> {
    fn default() -> Self {
        Self::empty()
    }
}

/// What a resolver reported for one key.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<V> {
    /// The resolver produced a result (which may itself carry an error).
    Resolved(LoadResult<V>),
    /// The resolver considered the key and explicitly found nothing.
    Missing,
}

/// Results of one resolver invocation, indexed by key id.
///
/// A key can be in one of three states: resolved, explicitly missing, or
/// absent. Absent keys were never mentioned by the resolver; strategies treat
/// them as "not in this batch" and may retry them individually, whereas
/// missing keys are final.
#[derive(Debug, Clone)]
pub struct ResultMap<V> {
    entries: HashMap<String, Outcome<V>>,
}

impl<V: Clone> ResultMap<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
        }
    }

    /// Builds a map where every key carries the same error.
    ///
    /// Useful for resolvers whose backend call failed as a whole.
    pub fn fail_all<K: Key>(keys: &Keys<K>, error: LoadError) -> Self {
        let mut map = Self::with_capacity(keys.len());
        for key in keys {
            map.set(key, LoadResult::err(error.clone()));
        }
        map
    }

    /// Records a result for `key`, replacing any previous entry.
    pub fn set<K: Key>(&mut self, key: &K, result: LoadResult<V>) {
        self.entries.insert(key.key_id(), Outcome::Resolved(result));
    }

    /// Marks `key` as explicitly missing.
    pub fn set_missing<K: Key>(&mut self, key: &K) {
        self.entries.insert(key.key_id(), Outcome::Missing);
    }

    /// Records an outcome by key id.
    pub fn insert_outcome(&mut self, key_id: impl Into<String>, outcome: Outcome<V>) {
        self.entries.insert(key_id.into(), outcome);
    }

    /// Returns the raw outcome for `key`, or `None` if the key is absent.
    pub fn outcome<K: Key>(&self, key: &K) -> Option<&Outcome<V>> {
        self.entries.get(&key.key_id())
    }

    /// Returns the result for `key` and whether one was found.
    ///
    /// Missing and absent keys both report `found = false` with an empty
    /// result; use [`ResultMap::outcome`] to tell them apart.
    pub fn get_value<K: Key>(&self, key: &K) -> (LoadResult<V>, bool) {
        match self.outcome(key) {
            Some(Outcome::Resolved(result)) => (result.clone(), true),
            Some(Outcome::Missing) | None => (LoadResult::empty(), false),
        }
    }

    /// Returns true if the key is resolved or explicitly missing.
    pub fn contains<K: Key>(&self, key: &K) -> bool {
        self.entries.contains_key(&key.key_id())
    }

    /// Returns true if the key was explicitly marked missing.
    pub fn is_missing<K: Key>(&self, key: &K) -> bool {
        matches!(self.outcome(key), Some(Outcome::Missing))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the ids of all resolved or missing keys, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Outcome<V>> {
        self.entries.iter()
    }

    /// Copies every entry of `other` into this map, overwriting on conflict.
    pub fn merge(&mut self, other: &ResultMap<V>) {
        for (id, outcome) in &other.entries {
            self.entries.insert(id.clone(), outcome.clone());
        }
    }
}

impl<V: Clone> Default for ResultMap<V> {
    fn default() -> Self {
        Self::new()
    }
}
