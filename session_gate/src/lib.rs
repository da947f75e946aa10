//! session_gate - Opaque-token session tracking for the session-gate workspace
//!
//! This crate owns the session lifecycle (issue, validate, refresh, revoke) over a
//! pluggable user record store, plus the login/logout/user-management flows that
//! the HTTP layer in `session_gate_axum` exposes.

mod config;
mod coordination;
mod session;
mod userdb;
mod utils;

#[cfg(test)]
mod test_utils;

pub use config::GATE_API_PREFIX;

pub use coordination::{
    CoordinationError, Gateway, LoginOutcome, MIN_PASSWORD_LENGTH, PublicUser, change_password_core,
    check_session_core, create_user_core, delete_user_core, get_user_core, list_users_core,
    login_core, logout_core,
};

pub use session::{
    IssuedSession, InvalidReason, SESSION_TTL_SECONDS, SessionCheck, SessionConfig, SessionError,
    SessionStore,
};

pub use userdb::{
    DataStoreType, InMemoryUserStore, PostgresUserStore, Role, SessionState, SqliteUserStore,
    UserError, UserRecord, UserSearchField, UserStore, connect_user_store,
};

pub use utils::{
    UtilError, gen_random_string, hash_password, hash_password_blocking, verify_password,
    verify_password_blocking,
};
