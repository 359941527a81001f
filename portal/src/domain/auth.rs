//! Login input and the admin role gate.
//!
//! Credentials are compared byte for byte against the directory, so neither
//! field is normalised here. A padded username is a different username.

use thiserror::Error;
use zeroize::Zeroizing;

use crate::domain::{Error, Role};

/// Rejected login input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginValidationError {
    /// No username was given.
    #[error("username must not be blank")]
    BlankUsername,
    /// No password was given.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// Username and password exactly as typed at the login prompt.
///
/// # Examples
/// ```
/// use portal::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" admin", "admin123").unwrap();
/// assert_eq!(creds.username(), " admin");
/// assert!(LoginCredentials::try_from_parts("  ", "admin123").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Accept any username with visible characters and any non-empty
    /// password, keeping both verbatim.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        if username.trim().is_empty() {
            return Err(LoginValidationError::BlankUsername);
        }
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username: username.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username as entered.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password as entered.
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Reject callers that do not hold the admin role.
///
/// # Examples
/// ```
/// use portal::domain::{Role, ensure_admin};
///
/// assert!(ensure_admin(Role::Admin).is_ok());
/// assert!(ensure_admin(Role::User).is_err());
/// ```
pub fn ensure_admin(role: Role) -> Result<(), Error> {
    if role.is_admin() {
        Ok(())
    } else {
        Err(Error::forbidden("administrator role required"))
    }
}
