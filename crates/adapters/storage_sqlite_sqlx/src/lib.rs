//! # knxhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence backend using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the `StateChangeSink` port defined in `knxhub-app::ports`
//! - Manage the `SQLite` connection pool lifecycle
//! - Run the embedded migrations creating the `state_changes` table
//!
//! ## Dependency rule
//! Depends on `knxhub-app` (for port traits) and `knxhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod error;
pub mod pool;
pub mod state_change_sink;

pub use error::StorageError;
pub use pool::{Config, Database};
pub use state_change_sink::SqliteStateChangeSink;
