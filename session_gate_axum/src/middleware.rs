use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, SecondsFormat, Utc};

use session_gate::{InvalidReason, SessionCheck, UserSearchField};

use crate::config::{CORS_ALLOW_METHODS, GateConfig};
use crate::error::IntoResponseError;
use crate::response::ApiError;
use crate::state::GateState;

/// Set on the forwarded request and mirrored on the response of every gated call
pub const X_GATE_PROCESSED: &str = "x-gate-processed";
/// Username of the validated subject, set on the forwarded request
pub const X_GATE_USERNAME: &str = "x-gate-username";
/// Refreshed session expiry in RFC 3339, on the forwarded request and the response
pub const X_SESSION_EXPIRES: &str = "x-session-expires";

/// How the gate treats a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// CORS preflight, answered by the gate itself
    Preflight,
    /// Forwarded without credentials
    Public,
    /// Forwarded without credentials; the handler inspects the session itself
    SessionCheck,
    /// Requires a valid, refreshed session
    Protected,
    /// Outside the API prefix, forwarded untouched
    Unguarded,
}

/// Validated subject, attached to the request extensions of protected calls
#[derive(Debug, Clone, PartialEq)]
pub struct GateContext {
    pub subject_id: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

/// Classify a request; the first matching rule wins
pub fn classify(config: &GateConfig, method: &Method, path: &str) -> RouteClass {
    if method == Method::OPTIONS {
        RouteClass::Preflight
    } else if config.is_public(path) {
        RouteClass::Public
    } else if path == config.session_check_path() {
        RouteClass::SessionCheck
    } else if config.is_protected(path) {
        RouteClass::Protected
    } else {
        RouteClass::Unguarded
    }
}

/// Access gate middleware
///
/// Mount with `axum::middleware::from_fn_with_state`. Protected calls must carry the
/// identity and token headers; a valid session is refreshed before the handler runs.
pub async fn access_gate(State(state): State<GateState>, mut req: Request, next: Next) -> Response {
    let config = state.config.as_ref();
    let path = req.uri().path().to_string();
    let class = classify(config, req.method(), &path);

    tracing::debug!(method = %req.method(), %path, ?class, "Access gate");

    match class {
        RouteClass::Preflight => preflight_response(config),
        RouteClass::Unguarded => next.run(req).await,
        RouteClass::Public | RouteClass::SessionCheck => {
            with_cors(next.run(req).await, config)
        }
        RouteClass::Protected => {
            let context = match authorize(&state, req.headers(), &path).await {
                Ok(context) => context,
                Err(rejection) => return with_cors(rejection.into_response(), config),
            };

            let expires = format_expiry(context.expires_at);
            let forwarded = [
                (X_GATE_PROCESSED, "true"),
                (X_GATE_USERNAME, context.username.as_str()),
                (X_SESSION_EXPIRES, expires.as_str()),
            ];
            insert_headers(req.headers_mut(), &forwarded);
            req.extensions_mut().insert(context.clone());

            let mut response = next.run(req).await;
            insert_headers(
                response.headers_mut(),
                &[(X_GATE_PROCESSED, "true"), (X_SESSION_EXPIRES, expires.as_str())],
            );
            with_cors(response, config)
        }
    }
}

/// Check credentials of a protected call and refresh its session
async fn authorize(
    state: &GateState,
    headers: &HeaderMap,
    path: &str,
) -> Result<GateContext, ApiError> {
    let config = state.config.as_ref();

    let Some(username) = header_str(headers, config.identity_header()) else {
        tracing::warn!(%path, "Blocking request without identity header");
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            format!(
                "Authentication required. Please add {} header.",
                config.identity_header()
            ),
        )
        .with_path(path));
    };

    let Some(token) = header_str(headers, config.token_header()) else {
        tracing::warn!(%path, %username, "Blocking request without session token");
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "NO_SESSION_TOKEN",
            format!(
                "Session token required. Please add {} header.",
                config.token_header()
            ),
        )
        .with_path(path));
    };

    let check = state
        .gateway
        .sessions()
        .validate_and_refresh(&UserSearchField::Username(username.to_string()), token)
        .await
        .map_err(|e| {
            tracing::error!(%path, "Session validation failed: {}", e);
            ApiError::internal().with_path(path)
        })?;

    match check {
        SessionCheck::Valid {
            subject_id,
            username,
            expires_at,
        } => {
            tracing::debug!(%path, %username, %expires_at, "Session valid");
            Ok(GateContext {
                subject_id,
                username,
                expires_at,
            })
        }
        SessionCheck::Invalid(InvalidReason::TokenMismatch) => {
            tracing::warn!(%path, %username, "Session replaced by another login");
            Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                "SESSION_REPLACED",
                "Your account was logged in elsewhere. Please login again.",
            )
            .with_path(path))
        }
        SessionCheck::Invalid(reason) => {
            tracing::warn!(%path, %username, %reason, "Session expired");
            Err(ApiError::new(
                StatusCode::UNAUTHORIZED,
                "SESSION_EXPIRED",
                "Session expired. Please login again.",
            )
            .with_path(path))
        }
    }
}

/// Non-empty UTF-8 header value
pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn format_expiry(expires_at: DateTime<Utc>) -> String {
    expires_at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn insert_headers(headers: &mut HeaderMap, values: &[(&'static str, &str)]) {
    for (name, value) in values {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(*name), value);
            }
            Err(_) => tracing::error!("Failed to create {} header value", name),
        }
    }
}

fn preflight_response(config: &GateConfig) -> Response {
    let response = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Body::empty())
        .into_response_error();

    match response {
        Ok(response) => with_cors(response, config),
        Err(e) => e.into_response(),
    }
}

/// Attach the permissive CORS headers
pub(crate) fn with_cors(mut response: Response, config: &GateConfig) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        config.cors_allow_headers().clone(),
    );
    response
}
