//! In-memory [`TrackerStore`] used by tests and `stride serve --memory`.

use std::collections::HashMap;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Session, TrackerStore, User, UserCredentials};
use crate::measurements::{MeasurementsByWeek, WeeklyMeasurements};
use crate::progress::CompletionMap;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserCredentials>,
    sessions: HashMap<String, Session>,
    completions: HashMap<Uuid, CompletionMap>,
    measurements: HashMap<Uuid, MeasurementsByWeek>,
}

/// Process-local store. Everything is lost when it is dropped.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (stored) sessions.
    pub async fn session_count(&self) -> usize {
        self.tables.read().await.sessions.len()
    }
}

#[async_trait]
impl TrackerStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|creds| creds.user.email == email)
            .cloned())
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).map(|creds| creds.user.clone()))
    }

    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|creds| creds.user.email == email) {
            bail!("user with email {email:?} already exists");
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_owned(),
            display_name: display_name.to_owned(),
        };
        tables.users.insert(
            user.id,
            UserCredentials {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(user)
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .sessions
            .insert(session.token_digest.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token_digest: &str) -> Result<Option<Session>> {
        let tables = self.tables.read().await;
        Ok(tables.sessions.get(token_digest).cloned())
    }

    async fn delete_session(&self, token_digest: &str) -> Result<()> {
        self.tables.write().await.sessions.remove(token_digest);
        Ok(())
    }

    async fn list_completions(&self, user_id: Uuid) -> Result<CompletionMap> {
        let tables = self.tables.read().await;
        Ok(tables.completions.get(&user_id).cloned().unwrap_or_default())
    }

    async fn upsert_completion(&self, user_id: Uuid, day_id: &str, done: bool) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .completions
            .entry(user_id)
            .or_default()
            .set(day_id, done);
        Ok(())
    }

    async fn list_measurements(&self, user_id: Uuid) -> Result<MeasurementsByWeek> {
        let tables = self.tables.read().await;
        Ok(tables.measurements.get(&user_id).cloned().unwrap_or_default())
    }

    async fn upsert_measurements(
        &self,
        user_id: Uuid,
        week: u32,
        record: &WeeklyMeasurements,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .measurements
            .entry(user_id)
            .or_default()
            .save(week, record.clone());
        Ok(())
    }
}
