//! Configuration management for b64shell

pub mod schema;

pub use schema::Config;

use crate::error::{B64Error, B64Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("b64shell")
            .join("config.toml")
    }

    /// Get the default state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("b64shell")
    }

    /// Load configuration, falling back to defaults if the file does not exist
    pub async fn load(&self) -> B64Result<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> B64Result<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| B64Error::io(format!("reading config from {}", path.display()), e))?;

        toml::from_str(&content).map_err(|e| B64Error::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> B64Result<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        write_atomic(&self.config_path, content).await.map_err(|e| {
            B64Error::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    async fn ensure_config_dir(&self) -> B64Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| B64Error::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace `path` by writing a `.tmp` sibling and renaming it over the target
///
/// A crash mid-write leaves the old file intact.
pub async fn write_atomic(path: &Path, content: impl AsRef<[u8]>) -> std::io::Result<()> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// On-disk layout of the worker state directory
#[derive(Debug, Clone)]
pub struct StatePaths {
    root: PathBuf,
}

impl StatePaths {
    /// Use the given directory as the state root
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Directory holding one JSON file per cache store
    pub fn caches_dir(&self) -> PathBuf {
        self.root.join("caches")
    }

    /// Registration (worker lifecycle) state file
    pub fn registration_path(&self) -> PathBuf {
        self.root.join("registration.json")
    }

    /// Ensure all state directories exist
    pub async fn ensure(&self) -> B64Result<()> {
        for dir in [self.root.clone(), self.caches_dir()] {
            fs::create_dir_all(&dir).await.map_err(|e| {
                B64Error::io(format!("creating directory {}", dir.display()), e)
            })?;
        }
        Ok(())
    }
}

impl Default for StatePaths {
    fn default() -> Self {
        Self::new(ConfigManager::state_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.app.name, "base64-app");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.app.version = "1.2.3".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.app.version, "1.2.3");
    }

    #[tokio::test]
    async fn invalid_toml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        tokio::fs::write(&path, "[app\nname = ").await.unwrap();

        let err = ConfigManager::with_path(path.clone())
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, B64Error::ConfigInvalid { path: p, .. } if p == path));
    }

    #[tokio::test]
    async fn write_atomic_replaces_without_leftovers() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("registration.json");
        tokio::fs::write(&path, "old").await.unwrap();

        write_atomic(&path, "new").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "new");
        assert!(!temp.path().join("registration.json.tmp").exists());
    }

    #[tokio::test]
    async fn write_atomic_failure_keeps_original() {
        let temp = TempDir::new().unwrap();
        // Renaming a file over a directory fails
        let path = temp.path().join("target");
        tokio::fs::create_dir(&path).await.unwrap();

        assert!(write_atomic(&path, "data").await.is_err());
        assert!(path.is_dir());
        assert!(!temp.path().join("target.tmp").exists());
    }

    #[tokio::test]
    async fn state_paths_ensure_creates_dirs() {
        let temp = TempDir::new().unwrap();
        let paths = StatePaths::new(temp.path().join("state"));
        paths.ensure().await.unwrap();

        assert!(paths.caches_dir().is_dir());
        assert_eq!(
            paths.registration_path(),
            temp.path().join("state").join("registration.json")
        );
    }
}
