use thiserror::Error;

use crate::userdb::UserError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// Issue or revoke addressed a subject that does not exist
    #[error("Subject not found")]
    SubjectNotFound,

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),

    /// Error from user database operations
    #[error("User error: {0}")]
    User(#[from] UserError),
}
