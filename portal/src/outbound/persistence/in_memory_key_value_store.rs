//! Process-local key-value slots.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

/// Slots held in memory for the lifetime of the value.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    slots: Mutex<HashMap<String, String>>,
}

impl InMemoryKeyValueStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store preloaded with `entries`.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            slots: Mutex::new(
                entries
                    .into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        let slots = self
            .slots
            .lock()
            .map_err(|err| KeyValueStoreError::read(key, err.to_string()))?;
        Ok(slots.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|err| KeyValueStoreError::write(key, err.to_string()))?;
        slots.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|err| KeyValueStoreError::write(key, err.to_string()))?;
        slots.remove(key);
        Ok(())
    }
}
