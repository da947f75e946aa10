//! Error types for the coordination layer

use thiserror::Error;

use crate::session::SessionError;
use crate::userdb::UserError;
use crate::utils::UtilError;

/// Errors that can occur while coordinating authentication flows
#[derive(Error, Debug)]
pub enum CoordinationError {
    /// A required request field is missing or empty
    #[error("Missing required fields")]
    MissingFields,

    #[error("Username is required")]
    MissingUsername,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Current password is incorrect")]
    InvalidCurrentPassword,

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error from Session operations
    #[error("Session error: {0}")]
    SessionError(SessionError),

    /// Error from the user database operations
    #[error("User error: {0}")]
    UserError(UserError),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    UtilsError(UtilError),
}

impl CoordinationError {
    /// Log the error and return self
    ///
    /// Client mistakes are logged at warn level, infrastructure failures at error level.
    pub fn log(self) -> Self {
        match &self {
            Self::MissingFields => tracing::warn!("Missing required fields"),
            Self::MissingUsername => tracing::warn!("Username is required"),
            Self::UserNotFound => tracing::warn!("User not found"),
            Self::InvalidPassword => tracing::warn!("Invalid password"),
            Self::InvalidCurrentPassword => tracing::warn!("Current password is incorrect"),
            Self::PasswordTooShort(min) => {
                tracing::warn!("Password shorter than {} characters", min)
            }
            Self::Conflict(message) => tracing::warn!("Conflict: {}", message),
            Self::SessionError(err) => tracing::error!("Session error: {}", err),
            Self::UserError(err) => tracing::error!("User error: {}", err),
            Self::UtilsError(err) => tracing::error!("Utils error: {}", err),
        }
        self
    }
}

// Infrastructure failures are logged as they are converted

impl From<SessionError> for CoordinationError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::SubjectNotFound => Self::UserNotFound,
            SessionError::User(UserError::Conflict(message)) => Self::Conflict(message),
            other => {
                let error = Self::SessionError(other);
                tracing::error!("{}", error);
                error
            }
        }
    }
}

impl From<UserError> for CoordinationError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound => Self::UserNotFound,
            UserError::Conflict(message) => Self::Conflict(message),
            other => {
                let error = Self::UserError(other);
                tracing::error!("{}", error);
                error
            }
        }
    }
}

impl From<UtilError> for CoordinationError {
    fn from(err: UtilError) -> Self {
        let error = Self::UtilsError(err);
        tracing::error!("{}", error);
        error
    }
}
