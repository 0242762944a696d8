//! Core domain for the stride workout tracker.
//!
//! - [`plan`]: CSV plan parsing into [`plan::PlanDay`] records.
//! - [`progress`]: week bucketing and completion counts.
//! - [`display`]: text splitting helpers for rendering plan cells.
//! - [`measurements`]: weekly body measurement records.
//! - [`sync`]: guest/cloud sync state machine and the client-side tracker.
//! - [`auth`]: accounts, password hashing, and session tokens.
//! - [`store`]: the persistence seam and its in-memory implementation.

pub mod auth;
pub mod display;
pub mod measurements;
pub mod plan;
pub mod progress;
pub mod store;
pub mod sync;
