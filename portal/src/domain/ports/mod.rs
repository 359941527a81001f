//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod key_value_store;
mod login_service;
mod object_storage;
mod user_repository;

#[cfg(test)]
pub use key_value_store::MockKeyValueStore;
pub use key_value_store::{KeyValueStore, KeyValueStoreError};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use object_storage::MockObjectStorage;
pub use object_storage::{BucketInfo, ObjectStorage, ObjectStorageError, ObjectUpload};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{FixtureUserRepository, UserPersistenceError, UserRepository};
