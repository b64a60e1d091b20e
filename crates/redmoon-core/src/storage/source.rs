//! Where the scheduler reads its configuration from.
//!
//! Nothing in the core caches a [`Config`]: every scheduling decision asks
//! its source for a fresh snapshot, so edits apply on the next reschedule.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::warn;

use super::Config;

pub trait ConfigSource: Send + Sync {
    fn snapshot(&self) -> Config;
}

/// Re-reads a TOML file on every snapshot.
///
/// A missing or unparsable file yields the defaults (toggling disabled),
/// so a broken config can never arm an alarm.
#[derive(Debug, Clone)]
pub struct FileConfig {
    path: PathBuf,
}

impl FileConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file at the default config location.
    pub fn default_location() -> crate::error::Result<Self> {
        Ok(Self::new(Config::path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileConfig {
    fn snapshot(&self) -> Config {
        if !self.path.exists() {
            return Config::default();
        }
        match Config::load_from(&self.path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "config unreadable, using defaults");
                Config::default()
            }
        }
    }
}

/// In-memory configuration shared with the embedding application.
#[derive(Debug, Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<Config>>,
}

impl SharedConfig {
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Apply an edit; later snapshots observe it.
    pub fn update(&self, edit: impl FnOnce(&mut Config)) {
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        edit(&mut guard);
    }
}

impl ConfigSource for SharedConfig {
    fn snapshot(&self) -> Config {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
