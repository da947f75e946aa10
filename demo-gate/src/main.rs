use std::sync::Arc;

use axum::Router;

use session_gate::{Role, create_user_core, list_users_core};
use session_gate_axum::{GateState, Gateway, session_gate_router, with_access_gate};

mod protected;
mod server;

use crate::server::{init_tracing, spawn_http_server};

const DEFAULT_PORT: u16 = 3001;

/// Accounts created on first start when the store is empty
const SEED_USERS: [(&str, &str, Role); 2] = [
    ("admin", "admin123", Role::Admin),
    ("alice", "alice123", Role::User),
];

async fn seed_users(gateway: &Gateway) -> Result<(), Box<dyn std::error::Error>> {
    if !list_users_core(gateway).await?.is_empty() {
        return Ok(());
    }

    for (username, password, role) in SEED_USERS {
        let user = create_user_core(gateway, username, password, role).await?;
        tracing::info!("Seeded user {} ({})", user.username, user.role);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing(env!("CARGO_CRATE_NAME"));

    let gateway = Arc::new(Gateway::from_env().await?);
    seed_users(&gateway).await?;

    let state = GateState::from_env(Arc::clone(&gateway))?;

    let app = Router::new()
        .merge(protected::router())
        .merge(session_gate_router(state.clone()));
    let app = with_access_gate(app, state);

    let port = std::env::var("DEMO_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    spawn_http_server(port, app).await?;
    Ok(())
}
