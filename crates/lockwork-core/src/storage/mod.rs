mod config;
mod database;

pub use config::Settings;
pub use database::SqliteSessionStore;

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/lockwork[-dev]/` based on LOCKWORK_ENV.
///
/// Set LOCKWORK_ENV=dev to use the development data directory.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("LOCKWORK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("lockwork-dev")
    } else {
        base_dir.join("lockwork")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
