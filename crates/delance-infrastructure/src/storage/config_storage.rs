//! TOML file storage with atomic writes.
//!
//! - **File locking**: exclusive lock around read-modify-write updates
//! - **Atomic writes**: tmp file + fsync + rename
//! - **Typed**: values go through serde, so a malformed file is a
//!   `Serialization` error instead of a partially applied config

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use delance_core::{DelanceError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub struct ConfigStorage<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ConfigStorage<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the file, returning `None` when it is missing or blank.
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(toml::from_str(&content)?))
    }

    /// Loads the file or falls back to `T::default()`.
    pub fn load_or_default(&self) -> Result<T> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Writes `value` atomically.
    pub fn save(&self, value: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(value)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(content.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Read-modify-write under an exclusive lock.
    ///
    /// Nothing is written when `f` fails.
    pub fn update<F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut T) -> Result<()>,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut value = self.load_or_default()?;
        f(&mut value)?;
        self.save(&value)?;

        Ok(value)
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| DelanceError::config("Config path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| DelanceError::config("Config path has no file name"))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Lock guard; the lock file is removed on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| DelanceError::internal(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delance_core::config::AppConfig;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage: ConfigStorage<AppConfig> =
            ConfigStorage::new(temp_dir.path().join("config.toml"));

        assert!(storage.load().unwrap().is_none());
        assert_eq!(storage.load_or_default().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let storage = ConfigStorage::new(temp_dir.path().join("nested/config.toml"));

        let mut config = AppConfig::default();
        config.ledger.rpc_url = "http://localhost:8545".to_string();
        storage.save(&config).unwrap();

        let loaded: AppConfig = storage.load().unwrap().unwrap();
        assert_eq!(loaded, config);
        assert!(!temp_dir.path().join("nested/.config.toml.tmp").exists());
    }

    #[test]
    fn test_malformed_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[ledger\nrpc_url = ").unwrap();

        let storage: ConfigStorage<AppConfig> = ConfigStorage::new(path);
        let err = storage.load().unwrap_err();
        assert!(matches!(err, DelanceError::Serialization { .. }));
    }

    #[test]
    fn test_update_applies_and_persists() {
        let temp_dir = TempDir::new().unwrap();
        let storage: ConfigStorage<AppConfig> =
            ConfigStorage::new(temp_dir.path().join("config.toml"));

        storage
            .update(|config| {
                config.session.refresh_attempts = 5;
                Ok(())
            })
            .unwrap();

        let updated = storage
            .update(|config| {
                config.session.refresh_attempts += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(updated.session.refresh_attempts, 6);
        assert_eq!(storage.load().unwrap().unwrap().session.refresh_attempts, 6);
        assert!(!temp_dir.path().join("config.lock").exists());
    }

    #[test]
    fn test_failed_update_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let storage: ConfigStorage<AppConfig> =
            ConfigStorage::new(temp_dir.path().join("config.toml"));

        let result = storage.update(|_| Err(DelanceError::config("rejected")));
        assert!(result.is_err());
        assert!(storage.load().unwrap().is_none());
    }
}
