//! [`TrackerStore`] backed by PostgreSQL.

use anyhow::{Result, bail};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use stride_core::measurements::{MeasurementsByWeek, WeeklyMeasurements};
use stride_core::progress::CompletionMap;
use stride_core::store::{Session, TrackerStore, User, UserCredentials};

use crate::queries::{completions, measurements, sessions, users};

/// PostgreSQL implementation of [`TrackerStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrackerStore for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        Ok(users::find_user_by_email(&self.pool, email)
            .await?
            .map(UserCredentials::from))
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(users::get_user(&self.pool, id).await?.map(|row| row.into_user()))
    }

    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        display_name: &str,
    ) -> Result<User> {
        if users::find_user_by_email(&self.pool, email).await?.is_some() {
            bail!("user with email {email} already exists");
        }
        let row = users::insert_user(&self.pool, email, password_hash, display_name).await?;
        Ok(row.into_user())
    }

    async fn insert_session(&self, session: &Session) -> Result<()> {
        sessions::insert_session(
            &self.pool,
            &session.token_digest,
            session.user_id,
            session.expires_at,
        )
        .await
    }

    async fn find_session(&self, token_digest: &str) -> Result<Option<Session>> {
        Ok(sessions::find_session(&self.pool, token_digest)
            .await?
            .map(Session::from))
    }

    async fn delete_session(&self, token_digest: &str) -> Result<()> {
        sessions::delete_session(&self.pool, token_digest).await?;
        Ok(())
    }

    async fn list_completions(&self, user_id: Uuid) -> Result<CompletionMap> {
        let rows = completions::list_completions(&self.pool, user_id).await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.day_id, row.is_done))
            .collect())
    }

    async fn upsert_completion(&self, user_id: Uuid, day_id: &str, done: bool) -> Result<()> {
        completions::upsert_completion(&self.pool, user_id, day_id, done).await
    }

    async fn list_measurements(&self, user_id: Uuid) -> Result<MeasurementsByWeek> {
        let rows = measurements::list_measurements(&self.pool, user_id).await?;
        let mut out = MeasurementsByWeek::new();
        for row in rows {
            let Some(week) = row.week() else {
                warn!(week_index = row.week_index, "skipping measurement row with invalid week");
                continue;
            };
            out.save(week, row.into_record());
        }
        Ok(out)
    }

    async fn upsert_measurements(
        &self,
        user_id: Uuid,
        week: u32,
        record: &WeeklyMeasurements,
    ) -> Result<()> {
        measurements::upsert_measurements(&self.pool, user_id, week, record).await
    }
}
