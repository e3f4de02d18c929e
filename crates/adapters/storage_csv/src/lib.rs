//! # knxhub-adapter-storage-csv
//!
//! File persistence backend: one `;`-delimited, CRLF-terminated row per state
//! change, appended to a single file.
//!
//! ```text
//! deviceId;timestampMillis;fieldName;value
//! lamp;1767225600000;powerState;1
//! ```
//!
//! ## Dependency rule
//! Depends on `knxhub-app` (for port traits) and `knxhub-domain` (for domain types).

mod error;
mod sink;

pub use error::CsvError;
pub use sink::CsvStateChangeSink;
