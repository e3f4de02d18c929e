//! `SQLite` implementation of [`StateChangeSink`].

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use knxhub_app::ports::StateChangeSink;
use knxhub_domain::device::DeviceId;
use knxhub_domain::error::HubError;
use knxhub_domain::history::HistoryEntry;
use knxhub_domain::state::StateChange;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain types without polluting
/// domain structs with database concerns.
struct Wrapper(HistoryEntry);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let device_id: String = row.try_get("device_id")?;
        let timestamp_millis: i64 = row.try_get("timestamp_ms")?;
        let field: String = row.try_get("field_name")?;
        let value: String = row.try_get("value")?;

        let device_id =
            DeviceId::new(device_id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let change = StateChange::from_persisted(&field, &value).ok_or_else(|| {
            sqlx::Error::Decode(Box::new(StorageError::UnknownChange { field, value }))
        })?;

        Ok(Self(HistoryEntry::new(device_id, timestamp_millis, change)))
    }
}

const INSERT: &str = r"
    INSERT INTO state_changes (device_id, timestamp_ms, field_name, value)
    VALUES (?, ?, ?, ?)
";

const SELECT_BY_DEVICE: &str = r"
    SELECT device_id, timestamp_ms, field_name, value FROM state_changes
    WHERE device_id = ?
    ORDER BY seq ASC
";

/// `SQLite`-backed persistence for state changes.
pub struct SqliteStateChangeSink {
    pool: SqlitePool,
}

impl SqliteStateChangeSink {
    /// Create a new sink using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stored changes of one device, in append order.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails or a row is unreadable.
    pub async fn find_by_device(&self, device_id: &DeviceId) -> Result<Vec<HistoryEntry>, HubError> {
        let rows: Vec<Wrapper> = sqlx::query_as(SELECT_BY_DEVICE)
            .bind(device_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }
}

impl StateChangeSink for SqliteStateChangeSink {
    async fn append(&self, entry: &HistoryEntry) -> Result<(), HubError> {
        sqlx::query(INSERT)
            .bind(entry.device_id.as_str())
            .bind(entry.timestamp_millis)
            .bind(entry.change.field_name())
            .bind(entry.change.value_text())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }
}
