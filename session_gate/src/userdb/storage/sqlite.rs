use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::userdb::{
    errors::UserError,
    types::{UserRecord, UserRow, UserSearchField},
};

use super::config::DB_TABLE_USERS;
use super::traits::UserStore;

/// User store backed by SQLite
#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    pool: Pool<Sqlite>,
}

impl SqliteUserStore {
    /// Create a lazily connecting store for `url`
    ///
    /// In-memory databases are pinned to a single connection that is never
    /// recycled, otherwise every new connection would see an empty database.
    pub fn connect(url: &str) -> Result<Self, UserError> {
        let opts = SqliteConnectOptions::from_str(url)
            .map_err(|e| UserError::Storage(format!("Invalid SQLite URL: {e}")))?
            .create_if_missing(true);

        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_lazy_with(opts)
        } else {
            SqlitePoolOptions::new().connect_lazy_with(opts)
        };

        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn init(&self) -> Result<(), UserError> {
        create_tables_sqlite(&self.pool).await
    }

    async fn get_user_by(&self, field: &UserSearchField) -> Result<Option<UserRecord>, UserError> {
        let table_name = DB_TABLE_USERS.as_str();

        let (column, value) = match field {
            UserSearchField::Id(id) => ("id", id),
            UserSearchField::Username(username) => ("username", username),
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT * FROM {table_name} WHERE {column} = ?
            "#
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::Storage(e.to_string()))?;

        row.map(UserRecord::try_from).transpose()
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, UserError> {
        let table_name = DB_TABLE_USERS.as_str();

        sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT * FROM {table_name} ORDER BY created_at ASC, id ASC
            "#
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| UserError::Storage(e.to_string()))?
        .into_iter()
        .map(UserRecord::try_from)
        .collect()
    }

    async fn upsert_user(&self, user: UserRecord) -> Result<UserRecord, UserError> {
        let table_name = DB_TABLE_USERS.as_str();
        let now = chrono::Utc::now();
        let (session_token, session_expires_at) = match &user.session {
            Some(session) => (Some(session.token.as_str()), Some(session.expires_at)),
            None => (None, None),
        };

        // created_at is only written on insert
        sqlx::query(&format!(
            r#"
            INSERT INTO {table_name}
                (id, username, password_hash, role, created_at, updated_at, session_token, session_expires_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                username = excluded.username,
                password_hash = excluded.password_hash,
                role = excluded.role,
                updated_at = excluded.updated_at,
                session_token = excluded.session_token,
                session_expires_at = excluded.session_expires_at
            "#
        ))
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(now)
        .bind(session_token)
        .bind(session_expires_at)
        .execute(&self.pool)
        .await
        .map_err(UserError::from)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT * FROM {table_name} WHERE id = ?
            "#
        ))
        .bind(&user.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| UserError::Storage(e.to_string()))?;

        UserRecord::try_from(row)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, UserError> {
        let table_name = DB_TABLE_USERS.as_str();

        let result = sqlx::query(&format!(
            r#"
            DELETE FROM {table_name} WHERE id = ?
            "#
        ))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| UserError::Storage(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

async fn create_tables_sqlite(pool: &Pool<Sqlite>) -> Result<(), UserError> {
    let table_name = DB_TABLE_USERS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            session_token TEXT,
            session_expires_at TIMESTAMP
        )
        "#
    ))
    .execute(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::userdb::types::{Role, SessionState};
    use chrono::{Duration, Utc};

    async fn memory_store() -> SqliteUserStore {
        let store = SqliteUserStore::connect("sqlite::memory:").expect("sqlite url");
        store.init().await.expect("create tables");
        store
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let store = memory_store().await;
        store.init().await.unwrap();
        assert!(store.get_all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_round_trips_through_row() {
        // Given a user holding a session
        let store = memory_store().await;
        let mut alice = UserRecord::new("alice".to_string(), "hash".to_string(), Role::Admin);
        let expires_at = Utc::now() + Duration::seconds(30);
        alice.session = Some(SessionState {
            token: "tok".to_string(),
            expires_at,
        });

        // When it is stored and read back by username
        store.upsert_user(alice.clone()).await.unwrap();
        let loaded = store.get_user_by_username("alice").await.unwrap().unwrap();

        // Then the session and role survive
        let session = loaded.session.expect("session");
        assert_eq!(session.token, "tok");
        assert_eq!(session.expires_at.timestamp(), expires_at.timestamp());
        assert_eq!(loaded.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_clearing_session_persists_nulls() {
        let store = memory_store().await;
        let mut alice = UserRecord::new("alice".to_string(), "hash".to_string(), Role::User);
        alice.session = Some(SessionState {
            token: "tok".to_string(),
            expires_at: Utc::now(),
        });
        let mut stored = store.upsert_user(alice).await.unwrap();

        stored.session = None;
        store.upsert_user(stored.clone()).await.unwrap();

        let loaded = store.get_user(&stored.id).await.unwrap().unwrap();
        assert!(loaded.session.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let store = memory_store().await;
        store
            .upsert_user(UserRecord::new("alice".to_string(), "h".to_string(), Role::User))
            .await
            .unwrap();

        let result = store
            .upsert_user(UserRecord::new("alice".to_string(), "h".to_string(), Role::User))
            .await;

        assert!(matches!(result, Err(UserError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_user_reports_existence() {
        let store = memory_store().await;
        let alice = store
            .upsert_user(UserRecord::new("alice".to_string(), "h".to_string(), Role::User))
            .await
            .unwrap();

        assert!(store.delete_user(&alice.id).await.unwrap());
        assert!(!store.delete_user(&alice.id).await.unwrap());
    }
}
