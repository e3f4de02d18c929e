//! Storage-specific error type wrapping sqlx errors.

use knxhub_domain::error::HubError;

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row names a field or value no state change can carry.
    #[error("stored change {field}={value:?} is not recognised")]
    UnknownChange { field: String, value: String },
}

impl From<StorageError> for HubError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}
