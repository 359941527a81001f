//! User data model.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zeroize::Zeroizing;

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Identifier was empty.
    EmptyId,
    /// Identifier was not a UUID.
    InvalidId,
    /// Username was blank once trimmed.
    EmptyUsername,
    /// Password was empty.
    EmptyPassword,
    /// Role string was neither `user` nor `admin`.
    UnknownRole {
        /// The rejected role string.
        value: String,
    },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::UnknownRole { value } => {
                write!(f, "role must be `user` or `admin`, got `{value}`")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid, String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid, uuid.to_string())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }

        let parsed = Uuid::parse_str(&id).map_err(|_| UserValidationError::InvalidId)?;
        Ok(Self(parsed, id))
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.1.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        let UserId(_, raw) = value;
        raw
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Login name. Trimmed, never blank; uniqueness is not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`].
    pub fn new(username: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = username.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Access level granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can browse and preview documents.
    User,
    /// Can additionally manage users and documents.
    Admin,
}

impl Role {
    /// Whether this role grants administrative operations.
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Lowercase wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UserValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(UserValidationError::UnknownRole {
                value: value.to_owned(),
            }),
        }
    }
}

/// Directory entry with a plaintext password.
///
/// ## Invariants
/// - `username` is trimmed and non-empty.
/// - `password` is non-empty and compared verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: Username,
    password: Zeroizing<String>,
    role: Role,
}

impl User {
    /// Build a new [`User`] from validated components.
    pub fn new(
        id: UserId,
        username: Username,
        password: impl Into<String>,
        role: Role,
    ) -> Result<Self, UserValidationError> {
        let password = password.into();
        if password.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }
        Ok(Self {
            id,
            username,
            password: Zeroizing::new(password),
            role,
        })
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Login name.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Access level.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Plaintext password, for persistence adapters only.
    pub(crate) fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Whether `username`/`password` match this record exactly.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username.as_ref() == username && self.password.as_str() == password
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Request payload for the admin-only "add user" operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Login name for the new account.
    pub username: Username,
    /// Plaintext password.
    pub password: Zeroizing<String>,
    /// Access level.
    pub role: Role,
}

impl NewUser {
    /// Validate raw inputs into a [`NewUser`].
    pub fn try_from_parts(
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<Self, UserValidationError> {
        let username = Username::new(username)?;
        if password.is_empty() {
            return Err(UserValidationError::EmptyPassword);
        }
        Ok(Self {
            username,
            password: Zeroizing::new(password.to_owned()),
            role,
        })
    }
}
