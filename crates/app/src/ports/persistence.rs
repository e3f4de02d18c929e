//! Persistence port: durable, append-only record of state changes.

use std::future::Future;
use std::sync::Arc;

use knxhub_domain::error::HubError;
use knxhub_domain::history::HistoryEntry;

/// Appends one row per observed state change.
pub trait StateChangeSink: Send + Sync {
    /// Append `(device id, timestamp, field, value)` for `entry`.
    fn append(&self, entry: &HistoryEntry) -> impl Future<Output = Result<(), HubError>> + Send;
}

impl<T: StateChangeSink> StateChangeSink for Arc<T> {
    fn append(&self, entry: &HistoryEntry) -> impl Future<Output = Result<(), HubError>> + Send {
        (**self).append(entry)
    }
}
