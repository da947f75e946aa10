#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Extension, Json, Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
    routing::get,
};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use session_gate::{
    Gateway, InMemoryUserStore, Role, SessionConfig, UserError, UserRecord, UserSearchField,
    UserStore, create_user_core,
};
use session_gate_axum::{
    GateConfig, GateContext, GateState, X_GATE_PROCESSED, session_gate_router_no_trace,
    with_access_gate,
};

pub struct TestApp {
    pub router: Router,
    pub gateway: Arc<Gateway>,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Echo the gate metadata a protected handler receives
async fn protected(Extension(context): Extension<GateContext>, headers: HeaderMap) -> Json<Value> {
    Json(json!({
        "success": true,
        "username": context.username,
        "subjectId": context.subject_id,
        "forwardedProcessed": headers.get(X_GATE_PROCESSED).and_then(|v| v.to_str().ok()),
        "forwardedUsername": headers.get("x-gate-username").and_then(|v| v.to_str().ok()),
    }))
}

fn build_router(gateway: Arc<Gateway>) -> Router {
    let config = GateConfig::new("/api", "x-username", "x-session-token").expect("gate config");
    let state = GateState::new(Arc::clone(&gateway), config);

    let app = Router::new()
        .route("/", get(|| async { "home" }))
        .route("/dashboard", get(|| async { "dashboard" }))
        .route("/api/protected", get(protected))
        .merge(session_gate_router_no_trace(state.clone()));

    with_access_gate(app, state)
}

/// App over an in-memory store with alice (user) and admin (admin)
pub async fn spawn_app() -> TestApp {
    let users = Arc::new(InMemoryUserStore::new()) as Arc<dyn UserStore>;
    let gateway = Arc::new(Gateway::new(users, SessionConfig::with_ttl_seconds(30)));

    create_user_core(&gateway, "alice", "alice123", Role::User)
        .await
        .expect("seed alice");
    create_user_core(&gateway, "admin", "admin123", Role::Admin)
        .await
        .expect("seed admin");

    TestApp {
        router: build_router(Arc::clone(&gateway)),
        gateway,
    }
}

/// App whose store fails every operation
pub fn spawn_broken_app() -> TestApp {
    let gateway = Arc::new(Gateway::new(
        Arc::new(BrokenStore) as Arc<dyn UserStore>,
        SessionConfig::with_ttl_seconds(30),
    ));
    TestApp {
        router: build_router(Arc::clone(&gateway)),
        gateway,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible router");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Log in and return the session token
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .send(json_request(
                Method::POST,
                "/api/auth/login",
                json!({"username": username, "password": password}),
            ))
            .await;
        assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.body);
        response.body["data"]["sessionToken"]
            .as_str()
            .expect("session token")
            .to_string()
    }

    pub async fn user(&self, username: &str) -> UserRecord {
        self.gateway
            .users()
            .get_user_by_username(username)
            .await
            .expect("lookup")
            .expect("user exists")
    }

    /// Overwrite the stored session expiry of `username`
    pub async fn set_expiry(&self, username: &str, expires_at: DateTime<Utc>) {
        let mut user = self.user(username).await;
        if let Some(session) = user.session.as_mut() {
            session.expires_at = expires_at;
        }
        self.gateway
            .users()
            .upsert_user(user)
            .await
            .expect("update expiry");
    }
}

pub fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn authed_request(
    method: Method,
    uri: &str,
    username: Option<&str>,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(username) = username {
        builder = builder.header("x-username", username);
    }
    if let Some(token) = token {
        builder = builder.header("x-session-token", token);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn authed_json_request(
    method: Method,
    uri: &str,
    username: &str,
    token: &str,
    body: Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-username", username)
        .header("x-session-token", token)
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn parse_expiry(headers: &HeaderMap) -> DateTime<Utc> {
    let raw = headers
        .get("x-session-expires")
        .and_then(|v| v.to_str().ok())
        .expect("x-session-expires header");
    DateTime::parse_from_rfc3339(raw)
        .expect("rfc3339 expiry")
        .with_timezone(&Utc)
}

#[derive(Debug)]
struct BrokenStore;

fn unavailable() -> UserError {
    UserError::Storage("connection refused".to_string())
}

#[async_trait]
impl UserStore for BrokenStore {
    async fn init(&self) -> Result<(), UserError> {
        Err(unavailable())
    }

    async fn get_user_by(&self, _field: &UserSearchField) -> Result<Option<UserRecord>, UserError> {
        Err(unavailable())
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, UserError> {
        Err(unavailable())
    }

    async fn upsert_user(&self, _user: UserRecord) -> Result<UserRecord, UserError> {
        Err(unavailable())
    }

    async fn delete_user(&self, _id: &str) -> Result<bool, UserError> {
        Err(unavailable())
    }
}
