//! The persistence seam for accounts, sessions, completions and
//! measurements.
//!
//! [`TrackerStore`] is implemented by [`MemoryStore`] here and by the
//! PostgreSQL store in `stride-db`. Completions and measurements are
//! always scoped to a user. Upserts are idempotent.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::measurements::{MeasurementsByWeek, WeeklyMeasurements};
use crate::progress::CompletionMap;

pub use memory::MemoryStore;

/// A signed-up account as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// A user together with the stored password hash.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A live session. Only the digest of the token is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token_digest: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Storage backend for the tracker service.
#[async_trait]
pub trait TrackerStore: Send + Sync {
    /// Look up a user by normalised email, including the password hash.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    /// Create a user. Fails if the email is already registered.
    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> Result<User>;

    async fn insert_session(&self, session: &Session) -> Result<()>;

    async fn find_session(&self, token_digest: &str) -> Result<Option<Session>>;

    /// Delete a session. Deleting an unknown session is not an error.
    async fn delete_session(&self, token_digest: &str) -> Result<()>;

    async fn list_completions(&self, user_id: Uuid) -> Result<CompletionMap>;

    async fn upsert_completion(&self, user_id: Uuid, day_id: &str, done: bool) -> Result<()>;

    async fn list_measurements(&self, user_id: Uuid) -> Result<MeasurementsByWeek>;

    /// Replace the record for `(user_id, week)`.
    async fn upsert_measurements(
        &self,
        user_id: Uuid,
        week: u32,
        record: &WeeklyMeasurements,
    ) -> Result<()>;
}

// Compile-time assertion: TrackerStore must be usable as `dyn TrackerStore`.
const _: () = {
    fn _assert_object_safe(_: &dyn TrackerStore) {}
};
