//! Directory-backed key-value slots.
//!
//! Each key maps to `<key>.json` inside a capability-scoped directory, so the
//! adapter can never touch files outside the configured data directory.

use std::io;

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use tracing::debug;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError};

use super::atomic_io::write_atomic;

/// Slots stored as JSON files in one directory.
#[derive(Debug)]
pub struct FileKeyValueStore {
    dir: Dir,
}

impl FileKeyValueStore {
    /// Open (creating when needed) the data directory at `root`.
    ///
    /// # Errors
    ///
    /// Returns the I/O error raised while creating or opening the directory.
    pub fn open(root: &Utf8Path) -> io::Result<Self> {
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        debug!(path = %root, "opened data directory");
        Ok(Self { dir })
    }

    /// Wrap an already opened directory.
    pub fn from_dir(dir: Dir) -> Self {
        Self { dir }
    }
}

fn slot_file(key: &str) -> Option<String> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    valid.then(|| format!("{key}.json"))
}

fn invalid_key(key: &str) -> String {
    format!("invalid slot key {key:?}; use ASCII letters, digits, `-` or `_`")
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError> {
        let file = slot_file(key).ok_or_else(|| KeyValueStoreError::read(key, invalid_key(key)))?;
        match self.dir.read_to_string(&file) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(KeyValueStoreError::read(key, err.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError> {
        let file = slot_file(key).ok_or_else(|| KeyValueStoreError::write(key, invalid_key(key)))?;
        write_atomic(&self.dir, &file, value)
            .map_err(|err| KeyValueStoreError::write(key, err.to_string()))?;
        debug!(key, bytes = value.len(), "slot written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), KeyValueStoreError> {
        let file = slot_file(key).ok_or_else(|| KeyValueStoreError::write(key, invalid_key(key)))?;
        match self.dir.remove_file(&file) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(KeyValueStoreError::write(key, err.to_string())),
        }
    }
}
