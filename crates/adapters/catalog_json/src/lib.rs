//! # knxhub-adapter-catalog-json
//!
//! Static catalogs read once at startup from the data directory:
//!
//! | File            | Content                                              |
//! |-----------------|------------------------------------------------------|
//! | `devices.json`  | devices and the group address of each of their roles |
//! | `webhooks.json` | `{ deviceId, url }` pairs fired when a device turns on |
//! | `sensors.json`  | external temperature endpoints relayed onto the bus  |
//!
//! A missing or unreadable file never stops the service: it is logged and the
//! corresponding catalog is empty.

mod error;
mod loader;

pub use error::CatalogError;
pub use loader::{Catalog, CatalogLoader, DEVICES_FILE, SENSORS_FILE, WEBHOOKS_FILE};
