use std::sync::Arc;

use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

use crate::session::config::SessionConfig;
use crate::session::errors::SessionError;
use crate::session::types::{InvalidReason, IssuedSession, SessionCheck};
use crate::userdb::{SessionState, UserRecord, UserSearchField, UserStore};
use crate::utils::gen_random_string;

use super::locks::{SubjectGuard, SubjectLocks};

/// Length in bytes of the random session token before encoding
const SESSION_TOKEN_BYTES: usize = 32;

/// Session lifecycle over a [`UserStore`]
///
/// Every mutation runs under the per-subject lock, so concurrent calls on the
/// same subject never lose an update. Calls on different subjects do not
/// contend.
pub struct SessionStore {
    users: Arc<dyn UserStore>,
    locks: SubjectLocks,
    config: SessionConfig,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(users: Arc<dyn UserStore>, config: SessionConfig) -> Self {
        Self {
            users,
            locks: SubjectLocks::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Hold the subject lock while running a read-modify-write outside this type
    pub(crate) async fn lock_subject(&self, subject_id: &str) -> SubjectGuard {
        self.locks.lock(subject_id).await
    }

    /// Start a new session, replacing any previous one
    #[tracing::instrument(skip(self), fields(subject = %subject))]
    pub async fn issue(&self, subject: &UserSearchField) -> Result<IssuedSession, SessionError> {
        let Some((_guard, user)) = self.load_locked(subject).await? else {
            tracing::debug!("Cannot issue session for unknown subject");
            return Err(SessionError::SubjectNotFound);
        };

        self.start_session(user).await
    }

    /// Issue a session only while the stored password hash still equals `password_hash`
    ///
    /// Returns `None` when the password was replaced after the caller verified it.
    #[tracing::instrument(skip(self, password_hash))]
    pub(crate) async fn issue_for_credential(
        &self,
        subject_id: &str,
        password_hash: &str,
    ) -> Result<Option<IssuedSession>, SessionError> {
        let subject = UserSearchField::Id(subject_id.to_string());
        let Some((_guard, user)) = self.load_locked(&subject).await? else {
            return Err(SessionError::SubjectNotFound);
        };

        if user.password_hash != password_hash {
            tracing::warn!(user_id = %user.id, "Password changed while logging in");
            return Ok(None);
        }

        self.start_session(user).await.map(Some)
    }

    /// Replace the session of a record loaded under its subject lock
    async fn start_session(&self, mut user: UserRecord) -> Result<IssuedSession, SessionError> {
        let token = gen_random_string(SESSION_TOKEN_BYTES)?;
        let expires_at = Utc::now() + self.config.ttl;
        let replaced = user.session.is_some();
        user.session = Some(SessionState {
            token: token.clone(),
            expires_at,
        });

        let user = self.users.upsert_user(user).await?;

        tracing::info!(user_id = %user.id, %expires_at, replaced, "Session issued");

        Ok(IssuedSession {
            subject_id: user.id,
            username: user.username,
            token,
            expires_at,
        })
    }

    /// Clear the session of a subject
    ///
    /// Returns `false` only when the subject does not exist.
    #[tracing::instrument(skip(self), fields(subject = %subject))]
    pub async fn revoke(&self, subject: &UserSearchField) -> Result<bool, SessionError> {
        let Some((_guard, mut user)) = self.load_locked(subject).await? else {
            return Ok(false);
        };

        if user.session.take().is_some() {
            let user = self.users.upsert_user(user).await?;
            tracing::info!(user_id = %user.id, "Session revoked");
        } else {
            tracing::debug!(user_id = %user.id, "No session to revoke");
        }

        Ok(true)
    }

    /// Read-only validity check
    pub async fn validate(
        &self,
        subject: &UserSearchField,
        token: &str,
    ) -> Result<bool, SessionError> {
        Ok(self.inspect(subject, token).await?.is_valid())
    }

    /// Read-only check reporting why a session is not valid
    ///
    /// Never refreshes and never clears an expired session.
    #[tracing::instrument(skip(self, token), fields(subject = %subject))]
    pub async fn inspect(
        &self,
        subject: &UserSearchField,
        token: &str,
    ) -> Result<SessionCheck, SessionError> {
        let Some(user) = self.users.get_user_by(subject).await? else {
            return Ok(SessionCheck::Invalid(InvalidReason::SubjectNotFound));
        };

        let check = match evaluate_session(user.session.as_ref(), token, Utc::now()) {
            Ok(session) => SessionCheck::Valid {
                expires_at: session.expires_at,
                subject_id: user.id,
                username: user.username,
            },
            Err(reason) => SessionCheck::Invalid(reason),
        };

        tracing::debug!(valid = check.is_valid(), reason = ?check.reason(), "Session inspected");
        Ok(check)
    }

    /// Check a session and slide its expiry forward on success
    ///
    /// An expired session is cleared before `SessionExpired` is reported.
    #[tracing::instrument(skip(self, token), fields(subject = %subject))]
    pub async fn validate_and_refresh(
        &self,
        subject: &UserSearchField,
        token: &str,
    ) -> Result<SessionCheck, SessionError> {
        let Some((_guard, mut user)) = self.load_locked(subject).await? else {
            return Ok(SessionCheck::Invalid(InvalidReason::SubjectNotFound));
        };

        let now = Utc::now();
        let outcome = evaluate_session(user.session.as_ref(), token, now).map(|_| ());
        match outcome {
            Ok(()) => {
                let expires_at = now + self.config.ttl;
                if let Some(session) = user.session.as_mut() {
                    session.expires_at = expires_at;
                }
                let user = self.users.upsert_user(user).await?;

                tracing::info!(user_id = %user.id, %expires_at, "Session refreshed");

                Ok(SessionCheck::Valid {
                    subject_id: user.id,
                    username: user.username,
                    expires_at,
                })
            }
            Err(InvalidReason::SessionExpired) => {
                user.session = None;
                let user = self.users.upsert_user(user).await?;

                tracing::warn!(user_id = %user.id, "Expired session cleared");

                Ok(SessionCheck::Invalid(InvalidReason::SessionExpired))
            }
            Err(reason) => {
                tracing::warn!(user_id = %user.id, %reason, "Session rejected");
                Ok(SessionCheck::Invalid(reason))
            }
        }
    }

    /// Resolve the subject to its id, take its lock, then re-read the record
    async fn load_locked(
        &self,
        subject: &UserSearchField,
    ) -> Result<Option<(SubjectGuard, UserRecord)>, SessionError> {
        let subject_id = match subject {
            UserSearchField::Id(id) => id.clone(),
            UserSearchField::Username(_) => match self.users.get_user_by(subject).await? {
                Some(user) => user.id,
                None => return Ok(None),
            },
        };

        let guard = self.locks.lock(&subject_id).await;

        Ok(self
            .users
            .get_user(&subject_id)
            .await?
            .map(|user| (guard, user)))
    }
}

/// Check order: presence, equality, expiry
fn evaluate_session<'a>(
    session: Option<&'a SessionState>,
    presented: &str,
    now: DateTime<Utc>,
) -> Result<&'a SessionState, InvalidReason> {
    let session = session.ok_or(InvalidReason::NoSession)?;

    if !bool::from(session.token.as_bytes().ct_eq(presented.as_bytes())) {
        return Err(InvalidReason::TokenMismatch);
    }

    if session.expires_at <= now {
        return Err(InvalidReason::SessionExpired);
    }

    Ok(session)
}
