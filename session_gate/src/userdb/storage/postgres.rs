use async_trait::async_trait;
use sqlx::{PgPool, Pool, Postgres};

use crate::userdb::{
    errors::UserError,
    types::{UserRecord, UserRow, UserSearchField},
};

use super::config::DB_TABLE_USERS;
use super::traits::UserStore;

/// User store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Pool<Postgres>,
}

impl PostgresUserStore {
    /// Create a lazily connecting store for `url`
    pub fn connect(url: &str) -> Result<Self, UserError> {
        let pool = PgPool::connect_lazy(url)
            .map_err(|e| UserError::Storage(format!("Failed to create Postgres pool: {e}")))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn init(&self) -> Result<(), UserError> {
        create_tables_postgres(&self.pool).await
    }

    async fn get_user_by(&self, field: &UserSearchField) -> Result<Option<UserRecord>, UserError> {
        let table_name = DB_TABLE_USERS.as_str();

        let (column, value) = match field {
            UserSearchField::Id(id) => ("id", id),
            UserSearchField::Username(username) => ("username", username),
        };

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT * FROM {table_name} WHERE {column} = $1
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

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO {table_name}
                (id, username, password_hash, role, created_at, updated_at, session_token, session_expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                password_hash = EXCLUDED.password_hash,
                role = EXCLUDED.role,
                updated_at = EXCLUDED.updated_at,
                session_token = EXCLUDED.session_token,
                session_expires_at = EXCLUDED.session_expires_at
            RETURNING *
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
        .fetch_one(&self.pool)
        .await
        .map_err(UserError::from)?;

        UserRecord::try_from(row)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, UserError> {
        let table_name = DB_TABLE_USERS.as_str();

        let result = sqlx::query(&format!(
            r#"
            DELETE FROM {table_name} WHERE id = $1
            "#
        ))
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| UserError::Storage(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

async fn create_tables_postgres(pool: &Pool<Postgres>) -> Result<(), UserError> {
    let table_name = DB_TABLE_USERS.as_str();

    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            id TEXT PRIMARY KEY NOT NULL,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            session_token TEXT,
            session_expires_at TIMESTAMPTZ
        )
        "#
    ))
    .execute(pool)
    .await
    .map_err(|e| UserError::Storage(e.to_string()))?;

    Ok(())
}
