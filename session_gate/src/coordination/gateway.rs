use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::session::{IssuedSession, SessionConfig, SessionStore};
use crate::userdb::{DataStoreType, Role, UserRecord, UserStore, connect_user_store};

use super::errors::CoordinationError;

/// Minimum length of a new password, in characters
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Entry point bundling the user store with the session lifecycle on top of it
pub struct Gateway {
    users: Arc<dyn UserStore>,
    sessions: SessionStore,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    pub fn new(users: Arc<dyn UserStore>, config: SessionConfig) -> Self {
        let sessions = SessionStore::new(Arc::clone(&users), config);
        Self { users, sessions }
    }

    /// Build from `GATE_DATA_STORE_TYPE`, `GATE_DATA_STORE_URL` and `SESSION_TTL_SECONDS`
    pub async fn from_env() -> Result<Self, CoordinationError> {
        let store_type = DataStoreType::from_env()?;
        let users = connect_user_store(store_type).await?;
        Ok(Self::new(users, SessionConfig::default()))
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

/// User as exposed to clients, without password material or token
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Expiry of the stored session, if any, whether or not it has passed
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<UserRecord> for PublicUser {
    fn from(user: UserRecord) -> Self {
        Self {
            expires_at: user.session.map(|s| s.expires_at),
            id: user.id,
            username: user.username,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub session: IssuedSession,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::userdb::SessionState;
    use chrono::Duration;

    #[test]
    fn test_public_user_hides_secrets() {
        let mut user = UserRecord::new("alice".to_string(), "secret-hash".to_string(), Role::User);
        let expires_at = Utc::now() + Duration::seconds(30);
        user.session = Some(SessionState {
            token: "secret-token".to_string(),
            expires_at,
        });

        let public = PublicUser::from(user);
        let json = serde_json::to_string(&public).unwrap();

        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("secret-token"));
        assert!(json.contains("\"createdAt\""));
        assert!(json.contains("\"expiresAt\""));
        assert_eq!(public.expires_at, Some(expires_at));
    }

    #[test]
    fn test_public_user_without_session() {
        let user = UserRecord::new("bob".to_string(), "h".to_string(), Role::Admin);
        let value = serde_json::to_value(PublicUser::from(user)).unwrap();

        assert_eq!(value["role"], "admin");
        assert!(value["expiresAt"].is_null());
    }
}
