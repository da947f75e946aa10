use crate::userdb::{Role, UserRecord};
use crate::utils::hash_password_blocking;

use super::errors::CoordinationError;
use super::gateway::{Gateway, MIN_PASSWORD_LENGTH, PublicUser};

/// All users, oldest first
pub async fn list_users_core(gateway: &Gateway) -> Result<Vec<PublicUser>, CoordinationError> {
    let users = gateway.users().get_all_users().await?;
    Ok(users.into_iter().map(PublicUser::from).collect())
}

#[tracing::instrument(skip(gateway))]
pub async fn get_user_core(gateway: &Gateway, user_id: &str) -> Result<PublicUser, CoordinationError> {
    gateway
        .users()
        .get_user(user_id)
        .await?
        .map(PublicUser::from)
        .ok_or_else(|| CoordinationError::UserNotFound.log())
}

/// Delete a user together with its session
#[tracing::instrument(skip(gateway))]
pub async fn delete_user_core(gateway: &Gateway, user_id: &str) -> Result<(), CoordinationError> {
    let _guard = gateway.sessions().lock_subject(user_id).await;

    if !gateway.users().delete_user(user_id).await? {
        return Err(CoordinationError::UserNotFound.log());
    }

    tracing::info!("User deleted");
    Ok(())
}

/// Register a new user with a hashed password
#[tracing::instrument(skip(gateway, password))]
pub async fn create_user_core(
    gateway: &Gateway,
    username: &str,
    password: &str,
    role: Role,
) -> Result<PublicUser, CoordinationError> {
    if username.is_empty() || password.is_empty() {
        return Err(CoordinationError::MissingFields.log());
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoordinationError::PasswordTooShort(MIN_PASSWORD_LENGTH).log());
    }

    if gateway
        .users()
        .get_user_by_username(username)
        .await?
        .is_some()
    {
        return Err(
            CoordinationError::Conflict(format!("Username '{username}' is already taken")).log(),
        );
    }

    let record = UserRecord::new(username.to_string(), hash_password_blocking(password).await?, role);
    let user = gateway.users().upsert_user(record).await?;

    tracing::info!(user_id = %user.id, "User created");

    Ok(PublicUser::from(user))
}
