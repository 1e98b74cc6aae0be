//! Key/value storage standing in for browser storage.
//!
//! Compliance state (consent, age gate, terms) is persisted as string values
//! under fixed keys. Components take a [`KeyValueStore`] instead of reaching
//! for ambient global storage, so they can be driven by a [`MemoryStorage`]
//! in tests and bridged to a session store by the server.

use std::collections::{BTreeMap, BTreeSet};

/// Synchronous string key/value storage.
pub trait KeyValueStore {
    /// Read the value under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: String);

    /// Delete `key` if present.
    fn remove(&mut self, key: &str);
}

/// A pending write produced by [`MemoryStorage::take_changes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageChange {
    Set { key: String, value: String },
    Removed { key: String },
}

/// In-memory [`KeyValueStore`] that remembers which keys were written.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    dirty: BTreeSet<String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed storage with existing values without marking them changed.
    #[must_use]
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            dirty: BTreeSet::new(),
        }
    }

    /// Drain the writes made since the last call, in key order.
    pub fn take_changes(&mut self) -> Vec<StorageChange> {
        std::mem::take(&mut self.dirty)
            .into_iter()
            .map(|key| match self.entries.get(&key) {
                Some(value) => StorageChange::Set {
                    value: value.clone(),
                    key,
                },
                None => StorageChange::Removed { key },
            })
            .collect()
    }

    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.dirty.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
        self.dirty.insert(key.to_string());
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.dirty.insert(key.to_string());
        }
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &mut T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) {
        (**self).set(key, value);
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key);
    }
}
