//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `knxhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use knxhub_app::resync::ResyncConfig;
use knxhub_app::supervisor::SupervisorConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Data directory settings.
    pub data: DataConfig,
    /// Bus gateway and supervision settings.
    pub bus: BusConfig,
    /// Full-resync settings.
    pub resync: ResyncSettings,
    /// Environmental bridge settings.
    pub bridge: BridgeConfig,
    /// Outbound webhook settings.
    pub webhooks: WebhooksConfig,
    /// History persistence settings.
    pub storage: StorageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Where catalogs, the auth code and the CSV history live.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub dir: PathBuf,
}

/// Bus gateway selection and connection supervision.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Gateway kind. Only `virtual` is built in.
    pub gateway: String,
    pub liveness_interval_ms: u64,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ResyncSettings {
    pub read_timeout_ms: u64,
    pub pace_ms: u64,
    /// Run a full resync once the bus first connects.
    pub on_startup: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub enabled: bool,
    pub period_secs: u64,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WebhooksConfig {
    pub request_timeout_ms: u64,
}

/// History persistence backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Csv,
    Sqlite,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// File name of the CSV history, relative to the data directory.
    pub csv_file: String,
    /// `SQLite` connection URL.
    pub database_url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `knxhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if a
    /// value fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("knxhub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("KNXHUB_HOST") {
            self.server.host = val;
        }
        if let Some(port) = var("KNXHUB_PORT").and_then(|val| val.parse().ok()) {
            self.server.port = port;
        }
        if let Some(val) = var("KNXHUB_BIND")
            && let Some((host, port)) = val.rsplit_once(':')
        {
            self.server.host = host.to_string();
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("KNXHUB_DATA_DIR") {
            self.data.dir = PathBuf::from(val);
        }
        match var("KNXHUB_STORAGE").as_deref() {
            Some("csv") => self.storage.backend = StorageBackend::Csv,
            Some("sqlite") => self.storage.backend = StorageBackend::Sqlite,
            _ => {}
        }
        if let Some(val) = var("KNXHUB_DATABASE_URL") {
            self.storage.database_url = val;
        }
        if let Some(val) = var("KNXHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.bus.gateway != "virtual" {
            return Err(ConfigError::Validation(format!(
                "unsupported bus gateway {:?}",
                self.bus.gateway
            )));
        }
        if self.bus.liveness_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "bus liveness interval must be non-zero".to_string(),
            ));
        }
        if self.bridge.period_secs == 0 {
            return Err(ConfigError::Validation(
                "bridge period must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Full path of the CSV history file.
    #[must_use]
    pub fn csv_path(&self) -> PathBuf {
        self.data.dir.join(&self.storage.csv_file)
    }

    #[must_use]
    pub fn supervisor(&self) -> SupervisorConfig {
        SupervisorConfig {
            liveness_interval: Duration::from_millis(self.bus.liveness_interval_ms),
            retry_delay: Duration::from_millis(self.bus.retry_delay_ms),
        }
    }

    #[must_use]
    pub fn resync(&self) -> ResyncConfig {
        ResyncConfig {
            read_timeout: Duration::from_millis(self.resync.read_timeout_ms),
            pace: Duration::from_millis(self.resync.pace_ms),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            gateway: "virtual".to_string(),
            liveness_interval_ms: 1000,
            retry_delay_ms: 1000,
        }
    }
}

impl Default for ResyncSettings {
    fn default() -> Self {
        Self {
            read_timeout_ms: 3000,
            pace_ms: 200,
            on_startup: true,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_secs: 60,
            request_timeout_ms: 5000,
        }
    }
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Csv,
            csv_file: "device_state_history.csv".to_string(),
            database_url: "sqlite:data/history.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "knxhubd=info,knxhub=info,tower_http=debug".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
