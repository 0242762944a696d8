//! Accounts and cookie sessions.
//!
//! [`AuthService`] implements sign-up, sign-in, session lookup and
//! sign-out on top of a [`TrackerStore`]. Tokens handed to clients are
//! opaque; the store only ever sees their digest.

pub mod password;
pub mod token;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::store::{Session, TrackerStore, User};

pub use password::{hash_password, verify_password};
pub use token::{generate_session_token, token_digest};

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Errors from account and session operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email and password are required")]
    MissingCredentials,

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("User already exists for this email")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Session cookie settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl: Duration,
    /// Mark the cookie `Secure` (HTTPS only).
    pub secure: bool,
}

impl SessionConfig {
    pub const DEFAULT_COOKIE_NAME: &str = "workout_session";
    pub const DEFAULT_TTL_DAYS: i64 = 30;
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: Self::DEFAULT_COOKIE_NAME.to_owned(),
            ttl: Duration::days(Self::DEFAULT_TTL_DAYS),
            secure: false,
        }
    }
}

/// A successful sign-up or sign-in: the user and the token to hand out.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Trim and lower-case an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Account operations over a [`TrackerStore`].
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn TrackerStore>,
    config: SessionConfig,
}

impl AuthService {
    pub fn new(store: Arc<dyn TrackerStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Create an account and open a session for it.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SignedIn, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort(MIN_PASSWORD_LEN));
        }
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let hash = hash_password(password)?;
        let user = self
            .store
            .insert_user(&email, &hash, display_name.trim())
            .await?;
        info!(user_id = %user.id, "account created");

        self.open_session(user).await
    }

    /// Verify credentials and open a session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let creds = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if !verify_password(password, &creds.password_hash)? {
            debug!(user_id = %creds.user.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        self.open_session(creds.user).await
    }

    /// Resolve a session token to its user.
    ///
    /// Unknown tokens resolve to `None`. Expired sessions are deleted and
    /// also resolve to `None`.
    pub async fn current_user(&self, token: &str) -> Result<Option<User>, AuthError> {
        let digest = token_digest(token);
        let Some(session) = self.store.find_session(&digest).await? else {
            return Ok(None);
        };

        if session.is_expired(Utc::now()) {
            debug!(user_id = %session.user_id, "session expired");
            self.store.delete_session(&digest).await?;
            return Ok(None);
        }

        Ok(self.store.get_user(session.user_id).await?)
    }

    /// Drop the session behind a token.
    pub async fn sign_out(&self, token: &str) -> Result<(), AuthError> {
        self.store.delete_session(&token_digest(token)).await?;
        Ok(())
    }

    async fn open_session(&self, user: User) -> Result<SignedIn, AuthError> {
        let token = generate_session_token();
        let expires_at = Utc::now() + self.config.ttl;
        self.store
            .insert_session(&Session {
                token_digest: token_digest(&token),
                user_id: user.id,
                expires_at,
            })
            .await?;
        debug!(user_id = %user.id, %expires_at, "session opened");
        Ok(SignedIn {
            user,
            token,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> (Arc<MemoryStore>, AuthService) {
        let store = Arc::new(MemoryStore::new());
        let auth = AuthService::new(store.clone(), SessionConfig::default());
        (store, auth)
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email("  Me@Example.COM "), "me@example.com");
    }

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let (_, auth) = service();
        let created = auth
            .sign_up(" Runner@Example.com", "secret1", " Runner ")
            .await
            .unwrap();
        assert_eq!(created.user.email, "runner@example.com");
        assert_eq!(created.user.display_name, "Runner");

        let signed_in = auth.sign_in("runner@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in.user.id, created.user.id);
        assert_ne!(signed_in.token, created.token);
    }

    #[tokio::test]
    async fn rejects_missing_credentials() {
        let (_, auth) = service();
        let err = auth.sign_up("  ", "secret1", "").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials), "got: {err}");
        let err = auth.sign_in("a@example.com", "").await.unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials), "got: {err}");
    }

    #[tokio::test]
    async fn rejects_short_password() {
        let (_, auth) = service();
        let err = auth.sign_up("a@example.com", "12345", "").await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordTooShort(6)), "got: {err}");
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let (_, auth) = service();
        auth.sign_up("a@example.com", "secret1", "").await.unwrap();
        let err = auth.sign_up("A@example.com ", "secret2", "").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken), "got: {err}");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (_, auth) = service();
        auth.sign_up("a@example.com", "secret1", "").await.unwrap();

        let wrong = auth.sign_in("a@example.com", "secret2").await.unwrap_err();
        let unknown = auth.sign_in("b@example.com", "secret1").await.unwrap_err();
        assert!(matches!(wrong, AuthError::InvalidCredentials));
        assert!(matches!(unknown, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn current_user_and_sign_out() {
        let (store, auth) = service();
        let signed = auth.sign_up("a@example.com", "secret1", "").await.unwrap();

        let user = auth.current_user(&signed.token).await.unwrap();
        assert_eq!(user, Some(signed.user.clone()));
        assert_eq!(auth.current_user("bogus").await.unwrap(), None);

        auth.sign_out(&signed.token).await.unwrap();
        assert_eq!(auth.current_user(&signed.token).await.unwrap(), None);
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn expired_session_is_deleted() {
        let store = Arc::new(MemoryStore::new());
        let config = SessionConfig {
            ttl: Duration::seconds(-1),
            ..SessionConfig::default()
        };
        let auth = AuthService::new(store.clone(), config);
        let signed = auth.sign_up("a@example.com", "secret1", "").await.unwrap();
        assert_eq!(store.session_count().await, 1);

        assert_eq!(auth.current_user(&signed.token).await.unwrap(), None);
        assert_eq!(store.session_count().await, 0);
    }
}
