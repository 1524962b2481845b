//! Loads the application configuration from `~/.config/delance/config.toml`.

use std::path::PathBuf;

use delance_core::Result;
use delance_core::config::AppConfig;
use tracing::info;

use crate::paths::DelancePaths;
use crate::storage::ConfigStorage;

pub struct ConfigService {
    storage: ConfigStorage<AppConfig>,
}

impl ConfigService {
    /// Uses the platform config directory.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(DelancePaths::config_file()?))
    }

    /// Uses an explicit file, mainly for tests and `--config`.
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            storage: ConfigStorage::new(path),
        }
    }

    /// Writes the defaults if no config file exists yet.
    pub fn ensure_exists(&self) -> Result<AppConfig> {
        if let Some(config) = self.storage.load()? {
            return Ok(config);
        }
        let config = AppConfig::default();
        self.storage.save(&config)?;
        info!("Created default config at {}", self.storage.path().display());
        Ok(config)
    }

    /// Applies `f` to the stored config and writes it back under a file lock.
    ///
    /// Returns the config as written.
    pub fn update<F>(&self, f: F) -> Result<AppConfig>
    where
        F: FnOnce(&mut AppConfig),
    {
        let config = self.storage.update(|config| {
            f(config);
            Ok(())
        })?;
        info!("Saved config to {}", self.storage.path().display());
        Ok(config)
    }
}
