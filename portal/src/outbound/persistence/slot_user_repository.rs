//! User directory persisted in the `users` key-value slot.
//!
//! The slot holds a JSON array of directory entries. Until the first user is
//! added the slot stays absent and the demo accounts are served instead.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::ports::{KeyValueStore, UserPersistenceError, UserRepository};
use crate::domain::seed::demo_users;
use crate::domain::{Role, User, UserId, Username};

/// Slot holding the serialised directory.
pub const USERS_KEY: &str = "users";

#[derive(Debug, Serialize, Deserialize)]
struct UserRecordDto {
    id: UserId,
    username: Username,
    password: String,
    role: Role,
}

impl From<&User> for UserRecordDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().clone(),
            username: user.username().clone(),
            password: user.password().to_owned(),
            role: user.role(),
        }
    }
}

impl TryFrom<UserRecordDto> for User {
    type Error = UserPersistenceError;

    fn try_from(record: UserRecordDto) -> Result<Self, Self::Error> {
        User::new(record.id, record.username, record.password, record.role)
            .map_err(|err| UserPersistenceError::unavailable(format!("invalid stored user: {err}")))
    }
}

/// [`UserRepository`] backed by a key-value slot.
pub struct SlotUserRepository<K> {
    slots: Arc<K>,
}

impl<K> SlotUserRepository<K> {
    /// Create a repository over `slots`.
    pub fn new(slots: Arc<K>) -> Self {
        Self { slots }
    }
}

fn defaults() -> Result<Vec<User>, UserPersistenceError> {
    demo_users().map_err(|err| UserPersistenceError::unavailable(err.to_string()))
}

#[async_trait]
impl<K> UserRepository for SlotUserRepository<K>
where
    K: KeyValueStore,
{
    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let raw = self
            .slots
            .get(USERS_KEY)
            .await
            .map_err(|err| UserPersistenceError::unavailable(err.to_string()))?;
        let Some(raw) = raw else {
            return defaults();
        };
        let records: Vec<UserRecordDto> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "users slot corrupt; serving demo users");
                return defaults();
            }
        };
        records.into_iter().map(User::try_from).collect()
    }

    async fn insert(&self, user: User) -> Result<(), UserPersistenceError> {
        let mut users = self.list().await?;
        users.push(user);
        let records: Vec<UserRecordDto> = users.iter().map(UserRecordDto::from).collect();
        let encoded = serde_json::to_string(&records)
            .map_err(|err| UserPersistenceError::unavailable(err.to_string()))?;
        self.slots
            .set(USERS_KEY, &encoded)
            .await
            .map_err(|err| UserPersistenceError::unavailable(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::outbound::persistence::InMemoryKeyValueStore;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn absent_slot_serves_demo_users_without_writing() {
        let slots = Arc::new(InMemoryKeyValueStore::new());
        let repo = SlotUserRepository::new(Arc::clone(&slots));
        let users = repo.list().await.expect("list");
        assert_eq!(users.len(), 2);
        assert!(slots.get(USERS_KEY).await.expect("get").is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn inserted_users_survive_a_new_repository() {
        let slots = Arc::new(InMemoryKeyValueStore::new());
        let user = User::new(
            UserId::random(),
            Username::new("auditor").expect("username"),
            "s3cret",
            Role::User,
        )
        .expect("user");
        SlotUserRepository::new(Arc::clone(&slots))
            .insert(user.clone())
            .await
            .expect("insert");

        let users = SlotUserRepository::new(slots).list().await.expect("list");
        assert_eq!(users.len(), 3);
        assert_eq!(users.last(), Some(&user));
    }
}
