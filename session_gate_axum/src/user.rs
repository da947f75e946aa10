use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use serde_json::json;

use session_gate::{delete_user_core, get_user_core, list_users_core};

use crate::error::IntoResponseError;
use crate::response::{ApiError, Envelope};
use crate::state::GateState;

pub(crate) fn router() -> Router<GateState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user).delete(delete_user))
}

/// List all users without password material
async fn list_users(State(state): State<GateState>) -> Result<Envelope, ApiError> {
    let users = list_users_core(&state.gateway).await.into_response_error()?;
    Ok(Envelope::ok("SUCCESS", "Users retrieved").data(json!(users)))
}

async fn get_user(
    State(state): State<GateState>,
    Path(user_id): Path<String>,
) -> Result<Envelope, ApiError> {
    let user = get_user_core(&state.gateway, &user_id)
        .await
        .into_response_error()?;
    Ok(Envelope::ok("SUCCESS", "User retrieved").data(json!(user)))
}

async fn delete_user(
    State(state): State<GateState>,
    Path(user_id): Path<String>,
) -> Result<Envelope, ApiError> {
    delete_user_core(&state.gateway, &user_id)
        .await
        .into_response_error()?;

    tracing::info!(%user_id, "User deleted via API");
    Ok(Envelope::ok("SUCCESS", "User deleted successfully"))
}
