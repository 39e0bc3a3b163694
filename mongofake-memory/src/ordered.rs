//! Insertion-ordered storage.
//!
//! [`OrderedStore`] is a thin wrapper over [`IndexMap`] that remembers the order in
//! which keys were first inserted. Overwriting a key keeps its original position;
//! deleting it shifts the later keys down so the order record has no holes.

use indexmap::IndexMap;

use mongofake_core::error::{MongoFakeError, MongoFakeResult};

#[derive(Debug, Clone)]
pub struct OrderedStore<V> {
    data: IndexMap<String, V>,
}

impl<V> Default for OrderedStore<V> {
    fn default() -> Self {
        Self { data: IndexMap::new() }
    }
}

impl<V> OrderedStore<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.data.get(key)
    }

    /// Returns the value for `key`, or `default` when the key is absent.
    pub fn get_or<'a>(&'a self, key: &str, default: &'a V) -> &'a V {
        self.data.get(key).unwrap_or(default)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.data.get_mut(key)
    }

    /// Returns the value for `key`, inserting the result of `create` first if absent.
    pub fn get_or_insert_with(&mut self, key: &str, create: impl FnOnce() -> V) -> &mut V {
        self.data.entry(key.to_string()).or_insert_with(create)
    }

    /// Removes `key` and returns its value, keeping the order of the remaining keys.
    ///
    /// # Errors
    ///
    /// Returns [`MongoFakeError::KeyNotFound`] if the key is absent.
    pub fn delete(&mut self, key: &str) -> MongoFakeResult<V> {
        self.data
            .shift_remove(key)
            .ok_or_else(|| MongoFakeError::KeyNotFound(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Keys in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Lazily yields `(key, value)` pairs in first-insertion order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &V)> {
        self.data.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.data.values()
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl<V: Clone> OrderedStore<V> {
    /// Stores a copy of `value` under `key`.
    ///
    /// A new key is appended to the order; an existing key keeps its position.
    pub fn set(&mut self, key: &str, value: &V) {
        match self.data.get_mut(key) {
            Some(existing) => *existing = value.clone(),
            None => {
                self.data.insert(key.to_string(), value.clone());
            }
        }
    }
}
