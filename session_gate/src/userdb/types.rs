use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::errors::UserError;

/// Authorization role of a user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(UserError::InvalidData(format!("Unknown role: {other}"))),
        }
    }
}

/// The single live session of a user
///
/// Token and expiry only ever exist together.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionState {
    /// Opaque session credential
    pub token: String,
    /// Absolute expiry; the session is valid strictly before this instant
    pub expires_at: DateTime<Utc>,
}

/// Persisted user record, including the embedded session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    /// Stable unique subject identifier
    pub id: String,
    /// Unique login name
    pub username: String,
    /// Encoded password hash, see [`crate::hash_password`]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Active session, if any
    pub session: Option<SessionState>,
}

impl UserRecord {
    /// Create a new user with a fresh id and no session
    pub fn new(username: String, password_hash: String, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
            session: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Lookup key for a user record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserSearchField {
    /// Subject id
    Id(String),
    /// Login name
    Username(String),
}

impl fmt::Display for UserSearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserSearchField::Id(id) => write!(f, "Id({id})"),
            UserSearchField::Username(username) => write!(f, "Username({username})"),
        }
    }
}

/// Flat row layout shared by the SQL stores
#[derive(Debug, FromRow)]
pub(crate) struct UserRow {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) password_hash: String,
    pub(crate) role: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) session_token: Option<String>,
    pub(crate) session_expires_at: Option<DateTime<Utc>>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = UserError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        // A row holding only one half of a session is treated as having none
        let session = match (row.session_token, row.session_expires_at) {
            (Some(token), Some(expires_at)) => Some(SessionState { token, expires_at }),
            _ => None,
        };

        Ok(Self {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            role: row.role.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
            session,
        })
    }
}
