use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use knxhub_domain::catalog::DeviceCatalog;
use knxhub_domain::device::Device;
use knxhub_domain::sensor::SensorEndpoint;
use knxhub_domain::webhook::Webhook;

use crate::error::CatalogError;

pub const DEVICES_FILE: &str = "devices.json";
pub const WEBHOOKS_FILE: &str = "webhooks.json";
pub const SENSORS_FILE: &str = "sensors.json";

/// Everything the hub reads from the data directory at startup.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    pub devices: DeviceCatalog,
    pub webhooks: Vec<Webhook>,
    pub sensors: Vec<SensorEndpoint>,
}

/// Reads catalog files from one directory.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    dir: PathBuf,
}

impl CatalogLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load all three catalogs, degrading each failing one to empty.
    #[must_use]
    pub fn load(&self) -> Catalog {
        let catalog = Catalog {
            devices: self.load_devices().unwrap_or_else(|err| {
                log_failure(&err);
                DeviceCatalog::empty()
            }),
            webhooks: self.load_webhooks().unwrap_or_else(|err| {
                log_failure(&err);
                Vec::new()
            }),
            sensors: self.load_sensors().unwrap_or_else(|err| {
                log_failure(&err);
                Vec::new()
            }),
        };
        tracing::info!(
            devices = catalog.devices.len(),
            webhooks = catalog.webhooks.len(),
            sensors = catalog.sensors.len(),
            dir = %self.dir.display(),
            "catalogs loaded"
        );
        catalog
    }

    /// # Errors
    ///
    /// Fails when the file is missing, is not a JSON array of devices, or
    /// declares a device id twice.
    pub fn load_devices(&self) -> Result<DeviceCatalog, CatalogError> {
        let path = self.dir.join(DEVICES_FILE);
        let devices: Vec<Device> = read_json(&path)?;
        DeviceCatalog::new(devices).map_err(|source| CatalogError::Invalid { path, source })
    }

    /// # Errors
    ///
    /// Fails when the file is missing or is not a JSON array of webhooks.
    pub fn load_webhooks(&self) -> Result<Vec<Webhook>, CatalogError> {
        read_json(&self.dir.join(WEBHOOKS_FILE))
    }

    /// # Errors
    ///
    /// Fails when the file is missing or is not a JSON array of sensor endpoints.
    pub fn load_sensors(&self) -> Result<Vec<SensorEndpoint>, CatalogError> {
        read_json(&self.dir.join(SENSORS_FILE))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn log_failure(err: &CatalogError) {
    tracing::error!(error = ?err, "catalog unavailable, using empty list");
}
