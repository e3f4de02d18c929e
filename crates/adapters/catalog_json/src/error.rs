use std::path::PathBuf;

use knxhub_domain::error::{HubError, ValidationError};

/// Why a catalog file could not be used.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("cannot read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a valid catalog", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{} is inconsistent", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

impl From<CatalogError> for HubError {
    fn from(err: CatalogError) -> Self {
        Self::Storage(Box::new(err))
    }
}
