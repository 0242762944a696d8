//! Database query functions for the `app_sessions` table.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::SessionRow;

pub async fn insert_session(
    pool: &PgPool,
    token_digest: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO app_sessions (token_digest, user_id, expires_at) \
         VALUES ($1, $2, $3)",
    )
    .bind(token_digest)
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await
    .with_context(|| format!("failed to insert session for user {user_id}"))?;

    Ok(())
}

pub async fn find_session(pool: &PgPool, token_digest: &str) -> Result<Option<SessionRow>> {
    let row = sqlx::query_as::<_, SessionRow>(
        "SELECT * FROM app_sessions WHERE token_digest = $1",
    )
    .bind(token_digest)
    .fetch_optional(pool)
    .await
    .context("failed to look up session")?;

    Ok(row)
}

/// Delete a session. Returns whether a row was removed.
pub async fn delete_session(pool: &PgPool, token_digest: &str) -> Result<bool> {
    let result = sqlx::query("DELETE FROM app_sessions WHERE token_digest = $1")
        .bind(token_digest)
        .execute(pool)
        .await
        .context("failed to delete session")?;

    Ok(result.rows_affected() > 0)
}

/// Delete every session that expired before `now`. Returns the number
/// removed.
pub async fn delete_expired_sessions(pool: &PgPool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query("DELETE FROM app_sessions WHERE expires_at < $1")
        .bind(now)
        .execute(pool)
        .await
        .context("failed to delete expired sessions")?;

    Ok(result.rows_affected())
}
