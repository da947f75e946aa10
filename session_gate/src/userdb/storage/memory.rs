use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::userdb::{
    errors::UserError,
    types::{UserRecord, UserSearchField},
};

use super::traits::UserStore;

/// Process-local user store
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn init(&self) -> Result<(), UserError> {
        Ok(())
    }

    async fn get_user_by(&self, field: &UserSearchField) -> Result<Option<UserRecord>, UserError> {
        let users = self.users.read().await;
        let found = match field {
            UserSearchField::Id(id) => users.get(id).cloned(),
            UserSearchField::Username(username) => {
                users.values().find(|u| &u.username == username).cloned()
            }
        };
        Ok(found)
    }

    async fn get_all_users(&self) -> Result<Vec<UserRecord>, UserError> {
        let users = self.users.read().await;
        let mut all: Vec<UserRecord> = users.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn upsert_user(&self, user: UserRecord) -> Result<UserRecord, UserError> {
        let mut users = self.users.write().await;

        if users
            .values()
            .any(|u| u.username == user.username && u.id != user.id)
        {
            return Err(UserError::Conflict(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }

        let mut stored = user;
        stored.updated_at = Utc::now();
        if let Some(existing) = users.get(&stored.id) {
            stored.created_at = existing.created_at;
        }

        users.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn delete_user(&self, id: &str) -> Result<bool, UserError> {
        Ok(self.users.write().await.remove(id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::userdb::types::{Role, SessionState};
    use chrono::Duration;

    fn user(name: &str) -> UserRecord {
        UserRecord::new(name.to_string(), "hash".to_string(), Role::User)
    }

    #[tokio::test]
    async fn test_upsert_and_lookup() {
        // Given an empty store
        let store = InMemoryUserStore::new();
        let alice = user("alice");

        // When a user is inserted
        let stored = store.upsert_user(alice.clone()).await.unwrap();

        // Then it is found by id and by username
        assert_eq!(stored.id, alice.id);
        let by_id = store.get_user(&alice.id).await.unwrap().unwrap();
        let by_name = store.get_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_id, by_name);
        assert!(store.get_user_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_preserves_created_at_and_session() {
        let store = InMemoryUserStore::new();
        let first = store.upsert_user(user("alice")).await.unwrap();

        let mut changed = first.clone();
        changed.created_at = Utc::now() + Duration::days(1);
        changed.session = Some(SessionState {
            token: "tok".to_string(),
            expires_at: Utc::now() + Duration::seconds(30),
        });
        let second = store.upsert_user(changed).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert_eq!(second.session.unwrap().token, "tok");
    }

    #[tokio::test]
    async fn test_upsert_rejects_duplicate_username() {
        let store = InMemoryUserStore::new();
        store.upsert_user(user("alice")).await.unwrap();

        let result = store.upsert_user(user("alice")).await;

        assert!(matches!(result, Err(UserError::Conflict(_))));
        assert_eq!(store.get_all_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_user() {
        let store = InMemoryUserStore::new();
        let alice = store.upsert_user(user("alice")).await.unwrap();

        assert!(store.delete_user(&alice.id).await.unwrap());
        assert!(!store.delete_user(&alice.id).await.unwrap());
        assert!(store.get_user(&alice.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_all_users_ordered_by_creation() {
        let store = InMemoryUserStore::new();
        let mut older = user("older");
        older.created_at = Utc::now() - Duration::hours(1);
        let newer = user("newer");

        store.upsert_user(newer).await.unwrap();
        store.upsert_user(older).await.unwrap();

        let names: Vec<String> = store
            .get_all_users()
            .await
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["older", "newer"]);
    }
}
