//! Shared fixtures for unit tests across modules

use std::sync::Arc;

use async_trait::async_trait;

use crate::userdb::{InMemoryUserStore, Role, UserError, UserRecord, UserSearchField, UserStore};
use crate::utils::hash_password;

/// Insert a user with a real password hash
pub(crate) async fn seed_user(
    users: &dyn UserStore,
    username: &str,
    password: &str,
    role: Role,
) -> UserRecord {
    let hash = hash_password(password).expect("hash password");
    users
        .upsert_user(UserRecord::new(username.to_string(), hash, role))
        .await
        .expect("seed user")
}

pub(crate) fn memory_users() -> Arc<InMemoryUserStore> {
    Arc::new(InMemoryUserStore::new())
}

/// A store whose every operation fails with a storage error
#[derive(Debug, Default)]
pub(crate) struct FailingUserStore;

fn unavailable() -> UserError {
    UserError::Storage("database unavailable".to_string())
}

#[async_trait]
impl UserStore for FailingUserStore {
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

/// Reads succeed from the wrapped store, writes fail
#[derive(Debug)]
pub(crate) struct ReadOnlyUserStore(pub(crate) Arc<InMemoryUserStore>);

#[async_trait]
impl UserStore for ReadOnlyUserStore {
    async fn init(&self) -> Result<(), UserError> {
        Ok(())
    }

    async fn get_user_by(&self, field: &UserSearchField) -> Result<Option<UserRecord>, UserError> {
        self.0.get_user_by(field).await
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, UserError> {
        self.0.get_all_users().await
    }

    async fn upsert_user(&self, _user: UserRecord) -> Result<UserRecord, UserError> {
        Err(unavailable())
    }

    async fn delete_user(&self, _id: &str) -> Result<bool, UserError> {
        Err(unavailable())
    }
}
