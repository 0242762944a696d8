//! Connections and schema setup for the stride database.
//!
//! `stride db-init` calls [`prepare_database`]; everything else only needs
//! [`create_pool`].

use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tracing::{debug, info};

use crate::config::DbConfig;
use crate::queries::sessions;

/// Migrations embedded at compile time from `crates/stride-db/migrations/`.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Tables owned by stride, in the order `db-init` reports them.
pub const TABLES: [&str; 4] = [
    "app_users",
    "app_sessions",
    "workout_completions",
    "weekly_measurements",
];

/// How many connections a pool may hold and how long to wait for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl PoolLimits {
    /// Request handling and CLI commands.
    pub const APP: Self = Self {
        max_connections: 5,
        acquire_timeout: Duration::from_secs(10),
    };

    /// A single admin connection to the `postgres` maintenance database.
    pub const ADMIN: Self = Self {
        max_connections: 1,
        acquire_timeout: Duration::from_secs(10),
    };

    pub async fn connect(self, url: &str) -> Result<PgPool> {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
            .connect(url)
            .await
            .with_context(|| format!("failed to connect to database at {url}"))
    }
}

pub async fn create_pool(config: &DbConfig) -> Result<PgPool> {
    PoolLimits::APP.connect(&config.database_url).await
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("failed to run database migrations")?;
    info!("stride schema is up to date");
    Ok(())
}

/// `CREATE DATABASE` takes no bind parameters, so the name is spliced in
/// and must be a plain identifier.
fn check_database_name(name: &str) -> Result<()> {
    let plain = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if !plain {
        bail!("database name {name:?} must be letters, digits and underscores");
    }
    Ok(())
}

/// Create the database named in `config` unless it already exists.
/// Returns whether it was created.
pub async fn ensure_database_exists(config: &DbConfig) -> Result<bool> {
    let name = config
        .database_name()
        .context("database URL has no database name")?;
    check_database_name(name)?;

    let admin = PoolLimits::ADMIN.connect(&config.maintenance_url()).await?;
    let result = async {
        let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM pg_database WHERE datname = $1")
            .bind(name)
            .fetch_optional(&admin)
            .await
            .context("failed to look up database")?;
        if found.is_some() {
            debug!(db = name, "database present");
            return Ok(false);
        }
        admin
            .execute(format!("CREATE DATABASE {name}").as_str())
            .await
            .with_context(|| format!("failed to create database {name}"))?;
        info!(db = name, "database created");
        Ok(true)
    }
    .await;
    admin.close().await;
    result
}

/// Drop sessions whose expiry has passed. Returns how many were removed.
pub async fn purge_expired_sessions(pool: &PgPool) -> Result<u64> {
    let removed = sessions::delete_expired_sessions(pool, Utc::now()).await?;
    if removed > 0 {
        info!(removed, "expired sessions purged");
    }
    Ok(removed)
}

/// Row count of each stride table, in [`TABLES`] order.
pub async fn table_counts(pool: &PgPool) -> Result<Vec<(&'static str, i64)>> {
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count rows in {table}"))?;
        counts.push((table, count));
    }
    Ok(counts)
}

/// Everything `stride db-init` does: create the database if needed, apply
/// migrations and clear out stale sessions. The returned pool is open.
pub async fn prepare_database(config: &DbConfig) -> Result<PgPool> {
    ensure_database_exists(config).await?;
    let pool = create_pool(config).await?;
    let setup = async {
        run_migrations(&pool).await?;
        purge_expired_sessions(&pool).await
    }
    .await;
    if let Err(e) = setup {
        pool.close().await;
        return Err(e);
    }
    Ok(pool)
}
