mod config;
mod source;

pub use config::{Config, LogConfig, MonitorConfig, ScheduleConfig};
pub use source::{ConfigSource, FileConfig, SharedConfig};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/redmoon[-dev]/` based on REDMOON_ENV.
///
/// Set REDMOON_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("REDMOON_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("redmoon-dev")
    } else {
        base_dir.join("redmoon")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
