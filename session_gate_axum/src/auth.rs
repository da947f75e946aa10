use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;

use session_gate::{
    InvalidReason, SessionCheck, change_password_core, check_session_core, login_core,
    logout_core,
};

use crate::error::IntoResponseError;
use crate::middleware::header_str;
use crate::response::{ApiError, Envelope};
use crate::state::GateState;

pub(crate) fn router() -> Router<GateState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session))
        .route("/auth/change-password", post(change_password))
}

/// Turn a malformed JSON body into a 400 envelope
pub(crate) fn json_rejection(rejection: JsonRejection) -> ApiError {
    tracing::warn!("Rejected request body: {}", rejection.body_text());
    ApiError::bad_request("Invalid request body")
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

/// Verify credentials and issue a session token
async fn login(
    State(state): State<GateState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Envelope, ApiError> {
    let Json(payload) = payload.map_err(json_rejection)?;

    let outcome = login_core(&state.gateway, &payload.username, &payload.password)
        .await
        .into_response_error()?;

    Ok(Envelope::ok("SUCCESS", "Login successful").data(json!({
        "id": outcome.user.id,
        "username": outcome.user.username,
        "role": outcome.user.role,
        "createdAt": outcome.user.created_at,
        "sessionToken": outcome.session.token,
        "expiresAt": outcome.session.expires_at,
    })))
}

#[derive(Debug, Deserialize)]
struct LogoutRequest {
    #[serde(default)]
    username: String,
}

async fn logout(
    State(state): State<GateState>,
    payload: Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<Envelope, ApiError> {
    let Json(payload) = payload.map_err(json_rejection)?;

    logout_core(&state.gateway, &payload.username)
        .await
        .into_response_error()?;

    Ok(Envelope::ok("SUCCESS", "Logout successful"))
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    username: Option<String>,
}

/// Report whether the presented session is valid, without refreshing it
///
/// The username comes from the identity header, falling back to `?username=`.
async fn session(
    State(state): State<GateState>,
    headers: HeaderMap,
    Query(query): Query<SessionQuery>,
) -> Result<Envelope, ApiError> {
    let config = state.config.as_ref();

    let username = header_str(&headers, config.identity_header())
        .map(str::to_string)
        .or_else(|| query.username.filter(|u| !u.trim().is_empty()));
    let token = header_str(&headers, config.token_header());

    let (Some(username), Some(token)) = (username, token) else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "MISSING_HEADERS",
            format!(
                "Both {} and {} are required",
                config.identity_header(),
                config.token_header()
            ),
        )
        .with_valid(false));
    };

    let check = check_session_core(&state.gateway, &username, token)
        .await
        .into_response_error()
        .map_err(|e| e.with_valid(false))?;

    match check {
        SessionCheck::Valid {
            username,
            expires_at,
            ..
        } => Ok(Envelope::ok("SESSION_VALID", "Session is valid")
            .data(json!({ "username": username, "expiresAt": expires_at }))
            .valid(true)),
        SessionCheck::Invalid(InvalidReason::TokenMismatch) => Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "SESSION_REPLACED",
            "Session has been replaced by another login",
        )
        .with_valid(false)),
        SessionCheck::Invalid(_) => Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "SESSION_EXPIRED",
            "Session expired",
        )
        .with_valid(false)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    current_password: String,
    #[serde(default)]
    new_password: String,
}

async fn change_password(
    State(state): State<GateState>,
    payload: Result<Json<ChangePasswordRequest>, JsonRejection>,
) -> Result<Envelope, ApiError> {
    let Json(payload) = payload.map_err(json_rejection)?;

    change_password_core(
        &state.gateway,
        &payload.user_id,
        &payload.current_password,
        &payload.new_password,
    )
    .await
    .into_response_error()?;

    Ok(Envelope::ok("SUCCESS", "Password changed successfully"))
}
