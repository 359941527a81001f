//! User directory service: credential checks and admin-only user creation.
//!
//! Passwords are compared verbatim; the first entry matching both username
//! and password wins. Usernames are not required to be unique.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{LoginService, UserPersistenceError, UserRepository};
use crate::domain::{Error, LoginCredentials, NewUser, Role, User, UserId, ensure_admin};

fn map_user_persistence_error(err: UserPersistenceError) -> Error {
    Error::service_unavailable(err.to_string())
}

/// Directory-backed [`LoginService`].
#[derive(Clone)]
pub struct UserDirectory {
    users: Arc<dyn UserRepository>,
}

impl UserDirectory {
    /// Create a directory over `users`.
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Every user in insertion order.
    pub async fn list(&self) -> Result<Vec<User>, Error> {
        self.users.list().await.map_err(map_user_persistence_error)
    }

    /// Create a user on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ErrorCode::Forbidden`] unless `actor` is an
    /// admin.
    pub async fn add_user(&self, actor: Role, new_user: NewUser) -> Result<User, Error> {
        ensure_admin(actor)?;
        let NewUser {
            username,
            password,
            role,
        } = new_user;
        let user = User::new(UserId::random(), username, password.as_str(), role)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.users
            .insert(user.clone())
            .await
            .map_err(map_user_persistence_error)?;
        info!(user_id = %user.id(), username = %user.username(), role = %user.role(), "user added");
        Ok(user)
    }
}

#[async_trait]
impl LoginService for UserDirectory {
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let users = self.list().await?;
        match users
            .into_iter()
            .find(|user| user.matches(credentials.username(), credentials.password()))
        {
            Some(user) => {
                info!(user_id = %user.id(), "login succeeded");
                Ok(user)
            }
            None => {
                warn!(username = credentials.username(), "login rejected");
                Err(Error::unauthorized("invalid username or password"))
            }
        }
    }
}
