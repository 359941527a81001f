//! Key-value slot adapters.
//!
//! - [`FileKeyValueStore`]: one JSON file per slot in the data directory,
//!   written atomically.
//! - [`InMemoryKeyValueStore`]: process-local slots for tests and dry runs.
//! - [`SlotUserRepository`]: the user directory kept in the `users` slot.

mod atomic_io;
mod file_key_value_store;
mod in_memory_key_value_store;
mod slot_user_repository;

pub use file_key_value_store::FileKeyValueStore;
pub use in_memory_key_value_store::InMemoryKeyValueStore;
pub use slot_user_repository::{SlotUserRepository, USERS_KEY};
