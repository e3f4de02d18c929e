//! History backend selected by configuration.

use knxhub_adapter_storage_csv::CsvStateChangeSink;
use knxhub_adapter_storage_sqlite_sqlx::{Config as SqliteConfig, SqliteStateChangeSink, StorageError};
use knxhub_app::ports::StateChangeSink;
use knxhub_domain::error::HubError;
use knxhub_domain::history::HistoryEntry;

use crate::config::{Config, StorageBackend};

/// Either persistence backend behind one concrete type.
pub enum HistorySink {
    Csv(CsvStateChangeSink),
    Sqlite(SqliteStateChangeSink),
}

impl HistorySink {
    /// Open the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the database cannot be opened or
    /// migrated. The CSV backend only checks the existing file and never
    /// fails here.
    pub async fn open(config: &Config) -> Result<Self, StorageError> {
        match config.storage.backend {
            StorageBackend::Csv => {
                let sink = CsvStateChangeSink::new(config.csv_path());
                match sink.read_all().await {
                    Ok(rows) => tracing::info!(
                        path = %sink.path().display(),
                        rows = rows.len(),
                        "persisting history to csv"
                    ),
                    Err(err) => tracing::warn!(
                        path = %sink.path().display(),
                        %err,
                        "existing history file is unreadable, appending anyway"
                    ),
                }
                Ok(Self::Csv(sink))
            }
            StorageBackend::Sqlite => {
                let database = SqliteConfig {
                    database_url: config.storage.database_url.clone(),
                }
                .build()
                .await?;
                tracing::info!(url = %config.storage.database_url, "persisting history to sqlite");
                Ok(Self::Sqlite(SqliteStateChangeSink::new(database.pool().clone())))
            }
        }
    }
}

impl StateChangeSink for HistorySink {
    async fn append(&self, entry: &HistoryEntry) -> Result<(), HubError> {
        match self {
            Self::Csv(sink) => sink.append(entry).await,
            Self::Sqlite(sink) => sink.append(entry).await,
        }
    }
}
