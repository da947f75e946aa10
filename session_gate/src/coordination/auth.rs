use crate::session::{InvalidReason, SessionCheck};
use crate::userdb::UserSearchField;
use crate::utils::{hash_password_blocking, verify_password_blocking};

use super::errors::CoordinationError;
use super::gateway::{Gateway, LoginOutcome, MIN_PASSWORD_LENGTH, PublicUser};

/// Verify credentials and start a new session, superseding any earlier one
#[tracing::instrument(skip(gateway, password))]
pub async fn login_core(
    gateway: &Gateway,
    username: &str,
    password: &str,
) -> Result<LoginOutcome, CoordinationError> {
    if username.is_empty() || password.is_empty() {
        return Err(CoordinationError::MissingFields.log());
    }

    let user = gateway
        .users()
        .get_user_by_username(username)
        .await?
        .ok_or_else(|| CoordinationError::UserNotFound.log())?;

    if !verify_password_blocking(password, &user.password_hash).await? {
        return Err(CoordinationError::InvalidPassword.log());
    }

    // The password may have changed while it was being verified
    let session = gateway
        .sessions()
        .issue_for_credential(&user.id, &user.password_hash)
        .await?
        .ok_or_else(|| CoordinationError::InvalidPassword.log())?;

    let mut user = PublicUser::from(user);
    user.expires_at = Some(session.expires_at);

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(LoginOutcome { user, session })
}

/// End the session of `username`
#[tracing::instrument(skip(gateway))]
pub async fn logout_core(gateway: &Gateway, username: &str) -> Result<(), CoordinationError> {
    if username.is_empty() {
        return Err(CoordinationError::MissingUsername.log());
    }

    let existed = gateway
        .sessions()
        .revoke(&UserSearchField::Username(username.to_string()))
        .await?;

    if !existed {
        return Err(CoordinationError::UserNotFound.log());
    }

    Ok(())
}

/// Report whether a session is valid without refreshing it
///
/// An unknown user is an error; every other invalid outcome is returned as a value.
#[tracing::instrument(skip(gateway, token))]
pub async fn check_session_core(
    gateway: &Gateway,
    username: &str,
    token: &str,
) -> Result<SessionCheck, CoordinationError> {
    let check = gateway
        .sessions()
        .inspect(&UserSearchField::Username(username.to_string()), token)
        .await?;

    match check {
        SessionCheck::Invalid(InvalidReason::SubjectNotFound) => {
            Err(CoordinationError::UserNotFound.log())
        }
        check => Ok(check),
    }
}

/// Replace the password of `user_id` after checking the current one
///
/// Hashing runs before the subject lock is taken. The active session, if any, is kept.
#[tracing::instrument(skip(gateway, current_password, new_password))]
pub async fn change_password_core(
    gateway: &Gateway,
    user_id: &str,
    current_password: &str,
    new_password: &str,
) -> Result<(), CoordinationError> {
    if user_id.is_empty() || current_password.is_empty() || new_password.is_empty() {
        return Err(CoordinationError::MissingFields.log());
    }

    if new_password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoordinationError::PasswordTooShort(MIN_PASSWORD_LENGTH).log());
    }

    let user = gateway
        .users()
        .get_user(user_id)
        .await?
        .ok_or_else(|| CoordinationError::UserNotFound.log())?;

    if !verify_password_blocking(current_password, &user.password_hash).await? {
        return Err(CoordinationError::InvalidCurrentPassword.log());
    }

    let new_hash = hash_password_blocking(new_password).await?;
    replace_password_hash(gateway, user_id, &user.password_hash, new_hash).await?;

    tracing::info!("Password changed");

    Ok(())
}

/// Swap the stored hash under the subject lock if it still equals `verified_hash`
async fn replace_password_hash(
    gateway: &Gateway,
    user_id: &str,
    verified_hash: &str,
    new_hash: String,
) -> Result<(), CoordinationError> {
    let _guard = gateway.sessions().lock_subject(user_id).await;

    let mut user = gateway
        .users()
        .get_user(user_id)
        .await?
        .ok_or_else(|| CoordinationError::UserNotFound.log())?;

    // Another change won the race; the verified password is no longer current
    if user.password_hash != verified_hash {
        return Err(CoordinationError::InvalidCurrentPassword.log());
    }

    user.password_hash = new_hash;
    gateway.users().upsert_user(user).await?;
    Ok(())
}
