use chrono::{DateTime, Utc};
use serde::Serialize;

/// A freshly issued session, returned by login
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IssuedSession {
    pub subject_id: String,
    pub username: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Why a presented session was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InvalidReason {
    /// The subject does not exist
    SubjectNotFound,
    /// The subject has no active session
    NoSession,
    /// The presented token is not the current one, typically after a newer login
    TokenMismatch,
    /// The current session is past its expiry
    SessionExpired,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::SubjectNotFound => "SubjectNotFound",
            InvalidReason::NoSession => "NoSession",
            InvalidReason::TokenMismatch => "TokenMismatch",
            InvalidReason::SessionExpired => "SessionExpired",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking a presented session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCheck {
    Valid {
        subject_id: String,
        username: String,
        expires_at: DateTime<Utc>,
    },
    Invalid(InvalidReason),
}

impl SessionCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionCheck::Valid { .. })
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            SessionCheck::Valid { expires_at, .. } => Some(*expires_at),
            SessionCheck::Invalid(_) => None,
        }
    }

    pub fn reason(&self) -> Option<InvalidReason> {
        match self {
            SessionCheck::Valid { .. } => None,
            SessionCheck::Invalid(reason) => Some(*reason),
        }
    }
}
