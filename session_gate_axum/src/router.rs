//! Routers for the authentication endpoints and the access gate

use axum::{Router, http::Uri, middleware};
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::middleware::access_gate;
use crate::response::ApiError;
use crate::state::GateState;

/// Authentication and user routes mounted under the configured API prefix
///
/// The endpoints will be available at:
/// - {prefix}/auth/login, {prefix}/auth/logout, {prefix}/auth/session,
///   {prefix}/auth/change-password
/// - {prefix}/users, {prefix}/users/{id}
///
/// Wrap the final application with [`with_access_gate`] to enforce sessions.
pub fn session_gate_router(state: GateState) -> Router {
    session_gate_router_no_trace(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(
                DefaultMakeSpan::new()
                    .level(Level::INFO)
                    .include_headers(false),
            )
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as [`session_gate_router`] without the HTTP tracing middleware
pub fn session_gate_router_no_trace(state: GateState) -> Router {
    let api = Router::new()
        .merge(super::auth::router())
        .merge(super::user::router());

    let prefix = state.config.api_prefix().to_string();
    let router = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&prefix, api)
    };

    router.with_state(state)
}

/// Put the access gate in front of every route of `router`
///
/// Unmatched paths get a JSON 404, so preflight requests are answered for any path.
pub fn with_access_gate(router: Router, state: GateState) -> Router {
    router
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state, access_gate))
}

async fn not_found(uri: Uri) -> ApiError {
    tracing::debug!(path = %uri.path(), "No route");
    ApiError::not_found(uri.path())
}
