//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return the current UTC time as milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> i64 {
    now().timestamp_millis()
}
