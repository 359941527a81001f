//! Port abstraction for the user directory and its in-memory fixture.
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::User;
use crate::domain::seed::demo_users;

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository state could not be accessed.
        Unavailable { message: String } => "user repository unavailable: {message}",
    }
}

/// Storage for directory entries. Entries are only ever appended.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Every user in insertion order.
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError>;

    /// Append a user. Duplicate usernames are accepted.
    async fn insert(&self, user: User) -> Result<(), UserPersistenceError>;
}

/// Process-local user table seeded with the demo accounts.
#[derive(Debug, Default)]
pub struct FixtureUserRepository {
    users: Mutex<Vec<User>>,
}

impl FixtureUserRepository {
    /// Table preloaded with [`demo_users`].
    ///
    /// # Examples
    /// ```
    /// use portal::domain::ports::FixtureUserRepository;
    ///
    /// let repo = FixtureUserRepository::with_demo_users();
    /// assert!(repo.is_ok());
    /// ```
    pub fn with_demo_users() -> Result<Self, crate::domain::UserValidationError> {
        Ok(Self::from_users(demo_users()?))
    }

    /// Table preloaded with `users`.
    pub fn from_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
        }
    }
}

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let guard = self
            .users
            .lock()
            .map_err(|err| UserPersistenceError::unavailable(err.to_string()))?;
        Ok(guard.clone())
    }

    async fn insert(&self, user: User) -> Result<(), UserPersistenceError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|err| UserPersistenceError::unavailable(err.to_string()))?;
        guard.push(user);
        Ok(())
    }
}
