//! Persisted login session.
//!
//! The logged-in identity lives in the `user` slot. Only the id, username
//! and role are stored; the password never leaves the directory.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::ports::KeyValueStore;
use crate::domain::{Error, Role, User, UserId, Username, ensure_admin};

/// Slot holding the serialised session user.
pub const SESSION_KEY: &str = "user";

/// Identity recorded for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Directory id of the user.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Access level.
    pub role: Role,
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().clone(),
            username: user.username().clone(),
            role: user.role(),
        }
    }
}

/// Session slot accessor.
#[derive(Clone)]
pub struct SessionStore<K> {
    slots: Arc<K>,
}

impl<K> SessionStore<K>
where
    K: KeyValueStore,
{
    /// Create a session accessor over `slots`.
    pub fn new(slots: Arc<K>) -> Self {
        Self { slots }
    }

    /// Record `user` as logged in.
    pub async fn login(&self, user: &User) -> Result<SessionUser, Error> {
        let session = SessionUser::from(user);
        let encoded = serde_json::to_string(&session)
            .map_err(|err| Error::internal(format!("failed to encode session: {err}")))?;
        self.slots
            .set(SESSION_KEY, &encoded)
            .await
            .map_err(|err| Error::service_unavailable(err.to_string()))?;
        info!(user_id = %session.id, role = %session.role, "session started");
        Ok(session)
    }

    /// Currently logged-in user. Unreadable sessions count as logged out.
    pub async fn current(&self) -> Option<SessionUser> {
        let raw = match self.slots.get(SESSION_KEY).await {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "session slot unreadable");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(error = %err, "session slot corrupt; treating as logged out");
                None
            }
        }
    }

    /// Current user, or `Unauthorized` when nobody is logged in.
    pub async fn require(&self) -> Result<SessionUser, Error> {
        self.current()
            .await
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Current user when they hold the admin role.
    pub async fn require_admin(&self) -> Result<SessionUser, Error> {
        let session = self.require().await?;
        ensure_admin(session.role)?;
        Ok(session)
    }

    /// End the session. Logging out twice is harmless.
    pub async fn logout(&self) -> Result<(), Error> {
        self.slots
            .remove(SESSION_KEY)
            .await
            .map_err(|err| Error::service_unavailable(err.to_string()))?;
        debug!("session cleared");
        Ok(())
    }
}
