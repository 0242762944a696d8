//! PostgreSQL persistence for stride.
//!
//! [`PgStore`] implements [`stride_core::store::TrackerStore`] on top of the
//! query modules in [`queries`]. Migrations are embedded from
//! `crates/stride-db/migrations/`.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

pub use config::DbConfig;
pub use store::PgStore;
