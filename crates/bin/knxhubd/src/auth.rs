//! Shared secret guarding the REST API.
//!
//! The code lives in `<data dir>/auth_code.txt`. A fresh random code is
//! written there on first start.

use std::io::ErrorKind;
use std::path::Path;

pub const AUTH_CODE_FILE: &str = "auth_code.txt";

/// Read the auth code, generating it if the file does not exist yet.
///
/// Returns `None` when the file exists but cannot be read or is blank, in
/// which case every guarded request is rejected.
pub fn load_or_create(data_dir: &Path) -> Option<String> {
    let path = data_dir.join(AUTH_CODE_FILE);
    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let code = content.trim();
            if code.is_empty() {
                tracing::error!(path = %path.display(), "auth code file is empty, API locked");
                return None;
            }
            Some(code.to_string())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => {
            let code = uuid::Uuid::new_v4().simple().to_string();
            match std::fs::write(&path, &code) {
                Ok(()) => {
                    tracing::info!(path = %path.display(), "generated new auth code");
                    Some(code)
                }
                Err(err) => {
                    tracing::error!(error = ?err, path = %path.display(), "cannot write auth code, API locked");
                    None
                }
            }
        }
        Err(err) => {
            tracing::error!(error = ?err, path = %path.display(), "cannot read auth code, API locked");
            None
        }
    }
}
