//! Database query functions for the `app_users` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::UserRow;

/// Insert a user. Fails on a duplicate email (unique constraint).
pub async fn insert_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    display_name: &str,
) -> Result<UserRow> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO app_users (email, password_hash, display_name) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(display_name)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to insert user {email}"))?;

    Ok(row)
}

pub async fn get_user(pool: &PgPool, id: Uuid) -> Result<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM app_users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to fetch user {id}"))?;

    Ok(row)
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>("SELECT * FROM app_users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("failed to look up user by email")?;

    Ok(row)
}
