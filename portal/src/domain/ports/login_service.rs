//! Driving port for login/authentication use-cases.
//!
//! Inbound adapters call it to authenticate credentials without knowing the
//! backing user table, so CLI tests can substitute a test double.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, User};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the matching directory entry.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<User, Error>;
}
