//! Port abstraction for the durable key-value slots the portal persists into.
//!
//! Each slot holds one serialised value under a fixed key (`documents`,
//! `user`). Adapters store raw strings; encoding stays in the domain so the
//! on-disk shape is identical across adapters.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by key-value slot adapters.
    pub enum KeyValueStoreError {
        /// Stored value could not be read.
        Read { key: String, message: String } => "failed to read slot {key}: {message}",
        /// Value could not be written or removed.
        Write { key: String, message: String } => "failed to write slot {key}: {message}",
    }
}

/// Durable string slots addressed by key.
///
/// Writers are not serialised: concurrent writers to the same key race and
/// the last write wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the raw value stored under `key`, or `None` when the slot is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, KeyValueStoreError>;

    /// Replace the value stored under `key`.
    async fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError>;

    /// Delete the slot. Removing an absent slot succeeds.
    async fn remove(&self, key: &str) -> Result<(), KeyValueStoreError>;
}
