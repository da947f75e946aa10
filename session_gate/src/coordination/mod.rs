//! Authentication coordination module
//!
//! High-level flows that combine the user store and the session lifecycle.
//! The HTTP layer calls into these functions and maps their errors to responses.

mod auth;
mod errors;
mod gateway;
mod user;

pub use auth::{change_password_core, check_session_core, login_core, logout_core};
pub use errors::CoordinationError;
pub use gateway::{Gateway, LoginOutcome, MIN_PASSWORD_LENGTH, PublicUser};
pub use user::{create_user_core, delete_user_core, get_user_core, list_users_core};
