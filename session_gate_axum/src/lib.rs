//! session_gate_axum - Axum integration for session-gate
//!
//! Provides the access gate middleware that checks and refreshes sessions on every
//! protected API call, plus the login/logout/session and user management routes.

mod auth;
mod config;
mod error;
mod middleware;
mod response;
mod router;
mod state;
mod user;

pub use config::{GATE_IDENTITY_HEADER, GATE_TOKEN_HEADER, GateConfig, GateConfigError};
pub use error::IntoResponseError;
pub use middleware::{
    GateContext, RouteClass, X_GATE_PROCESSED, X_GATE_USERNAME, X_SESSION_EXPIRES, access_gate,
    classify,
};
pub use response::{ApiError, Envelope};
pub use router::{session_gate_router, session_gate_router_no_trace, with_access_gate};
pub use state::GateState;

// Re-export the core entry points so applications need a single dependency
pub use session_gate::{GATE_API_PREFIX, Gateway};
