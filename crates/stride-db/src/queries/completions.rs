//! Database query functions for the `workout_completions` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::CompletionRow;

/// All completion rows for a user, ordered by day id.
pub async fn list_completions(pool: &PgPool, user_id: Uuid) -> Result<Vec<CompletionRow>> {
    let rows = sqlx::query_as::<_, CompletionRow>(
        "SELECT day_id, is_done FROM workout_completions \
         WHERE user_id = $1 \
         ORDER BY day_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to list completions for user {user_id}"))?;

    Ok(rows)
}

/// Insert or overwrite the flag for `(user_id, day_id)`.
pub async fn upsert_completion(
    pool: &PgPool,
    user_id: Uuid,
    day_id: &str,
    is_done: bool,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO workout_completions (user_id, day_id, is_done) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, day_id) \
         DO UPDATE SET is_done = EXCLUDED.is_done, updated_at = now()",
    )
    .bind(user_id)
    .bind(day_id)
    .bind(is_done)
    .execute(pool)
    .await
    .with_context(|| format!("failed to upsert completion {day_id} for user {user_id}"))?;

    Ok(())
}
