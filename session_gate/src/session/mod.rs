mod config;
mod errors;
mod main;
mod types;

pub use config::{SESSION_TTL_SECONDS, SessionConfig};
pub use errors::SessionError;
pub use main::SessionStore;
pub use types::{InvalidReason, IssuedSession, SessionCheck};
