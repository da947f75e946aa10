//! User store selection and table naming

use std::{env, str::FromStr, sync::Arc, sync::LazyLock};

use crate::userdb::errors::UserError;

use super::memory::InMemoryUserStore;
use super::postgres::PostgresUserStore;
use super::sqlite::SqliteUserStore;
use super::traits::UserStore;

/// Table prefix from environment variable
pub(crate) static DB_TABLE_PREFIX: LazyLock<String> =
    LazyLock::new(|| env::var("DB_TABLE_PREFIX").unwrap_or_else(|_| "gate_".to_string()));

/// Users table name
pub(crate) static DB_TABLE_USERS: LazyLock<String> =
    LazyLock::new(|| format!("{}{}", *DB_TABLE_PREFIX, "users"));

/// Backend holding the user records
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataStoreType {
    /// Process-local map, lost on restart
    Memory,
    Sqlite { url: String },
    Postgres { url: String },
}

impl DataStoreType {
    /// Read the backend from `GATE_DATA_STORE_TYPE` and `GATE_DATA_STORE_URL`
    ///
    /// Defaults to the in-memory store. SQL backends require a URL.
    pub fn from_env() -> Result<Self, UserError> {
        let store_type =
            env::var("GATE_DATA_STORE_TYPE").unwrap_or_else(|_| "memory".to_string());
        let store_url = env::var("GATE_DATA_STORE_URL").ok();
        Self::from_parts(&store_type, store_url)
    }

    fn from_parts(store_type: &str, store_url: Option<String>) -> Result<Self, UserError> {
        let require_url = |url: Option<String>| {
            url.filter(|u| !u.is_empty()).ok_or_else(|| {
                UserError::Storage(format!(
                    "GATE_DATA_STORE_URL must be set for store type '{store_type}'"
                ))
            })
        };

        match store_type.to_lowercase().as_str() {
            "memory" => Ok(DataStoreType::Memory),
            "sqlite" => Ok(DataStoreType::Sqlite {
                url: require_url(store_url)?,
            }),
            "postgres" => Ok(DataStoreType::Postgres {
                url: require_url(store_url)?,
            }),
            other => Err(UserError::Storage(format!(
                "Unsupported store type: {other}. Supported types are 'memory', 'sqlite' and 'postgres'"
            ))),
        }
    }
}

impl FromStr for DataStoreType {
    type Err = UserError;

    /// Parse a bare type name; SQL backends are rejected since they need a URL
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_parts(s, None)
    }
}

/// Build and initialize a user store for the given backend
pub async fn connect_user_store(store_type: DataStoreType) -> Result<Arc<dyn UserStore>, UserError> {
    let store: Arc<dyn UserStore> = match &store_type {
        DataStoreType::Memory => Arc::new(InMemoryUserStore::new()),
        DataStoreType::Sqlite { url } => Arc::new(SqliteUserStore::connect(url)?),
        DataStoreType::Postgres { url } => Arc::new(PostgresUserStore::connect(url)?),
    };

    store.init().await?;

    tracing::info!(store = kind_name(&store_type), "User store initialized");

    Ok(store)
}

fn kind_name(store_type: &DataStoreType) -> &'static str {
    match store_type {
        DataStoreType::Memory => "memory",
        DataStoreType::Sqlite { .. } => "sqlite",
        DataStoreType::Postgres { .. } => "postgres",
    }
}
