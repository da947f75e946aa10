use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::session::{SessionConfig, SessionStore};
use crate::userdb::{InMemoryUserStore, Role, SessionState, UserRecord, UserSearchField, UserStore};

pub(super) fn username(name: &str) -> UserSearchField {
    UserSearchField::Username(name.to_string())
}

/// Session store over an in-memory user store seeded with `names`
pub(super) async fn session_store(
    ttl_seconds: i64,
    names: &[&str],
) -> (SessionStore, Arc<InMemoryUserStore>) {
    let users = Arc::new(InMemoryUserStore::new());
    for name in names {
        users
            .upsert_user(UserRecord::new(
                name.to_string(),
                "unused-hash".to_string(),
                Role::User,
            ))
            .await
            .expect("seed user");
    }

    let store = SessionStore::new(
        users.clone() as Arc<dyn UserStore>,
        SessionConfig::with_ttl_seconds(ttl_seconds),
    );
    (store, users)
}

/// Overwrite the stored session of `name` directly
pub(super) async fn stored_session(
    users: &InMemoryUserStore,
    name: &str,
    token: &str,
    expires_at: DateTime<Utc>,
) {
    let mut user = users
        .get_user_by_username(name)
        .await
        .expect("lookup")
        .expect("user exists");
    user.session = Some(SessionState {
        token: token.to_string(),
        expires_at,
    });
    users.upsert_user(user).await.expect("update user");
}

/// Move the expiry of the current session of `name` into the past
pub(super) async fn expire_session(users: &InMemoryUserStore, name: &str) {
    let user = users
        .get_user_by_username(name)
        .await
        .expect("lookup")
        .expect("user exists");
    let session = user.session.expect("user has a session");
    stored_session(users, name, &session.token, Utc::now() - Duration::seconds(1)).await;
}
