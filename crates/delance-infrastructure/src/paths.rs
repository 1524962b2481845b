//! Unified path management for delance files.
//!
//! ```text
//! ~/.config/delance/           # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/delance/      # Data directory
//! └── logs/                    # Application logs
//!     └── delance.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

use delance_core::DelanceError;

const APP_DIR: &str = "delance";

pub struct DelancePaths;

impl DelancePaths {
    /// Returns the delance configuration directory (e.g. `~/.config/delance/`).
    pub fn config_dir() -> Result<PathBuf, DelanceError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| DelanceError::config("Cannot find configuration directory"))
    }

    /// Returns the delance data directory (e.g. `~/.local/share/delance/`).
    pub fn data_dir() -> Result<PathBuf, DelanceError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| DelanceError::config("Cannot find data directory"))
    }

    pub fn config_file() -> Result<PathBuf, DelanceError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn logs_dir() -> Result<PathBuf, DelanceError> {
        Ok(Self::data_dir()?.join("logs"))
    }
}
