use async_trait::async_trait;

use crate::userdb::{
    errors::UserError,
    types::{UserRecord, UserSearchField},
};

/// Persistence port for user records
///
/// Implementations keep `username` unique and report a collision as
/// [`UserError::Conflict`].
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Create tables or other backing structures if needed
    async fn init(&self) -> Result<(), UserError>;

    async fn get_user_by(&self, field: &UserSearchField) -> Result<Option<UserRecord>, UserError>;

    /// All users ordered by creation time
    async fn get_all_users(&self) -> Result<Vec<UserRecord>, UserError>;

    /// Insert or replace a record by id
    ///
    /// `updated_at` is set to the current time and the stored `created_at` is
    /// kept for existing records. Returns the record as persisted.
    async fn upsert_user(&self, user: UserRecord) -> Result<UserRecord, UserError>;

    /// Remove a record, returning whether it existed
    async fn delete_user(&self, id: &str) -> Result<bool, UserError>;

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, UserError> {
        self.get_user_by(&UserSearchField::Id(id.to_string())).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, UserError> {
        self.get_user_by(&UserSearchField::Username(username.to_string()))
            .await
    }
}
