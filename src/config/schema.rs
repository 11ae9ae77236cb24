//! Configuration schema for b64shell
//!
//! Configuration is stored at `~/.config/b64shell/config.toml`

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Application identity and deployment version
    pub app: AppConfig,

    /// Offline cache settings
    pub cache: CacheConfig,

    /// Network settings
    pub network: NetworkConfig,

    /// Worker lifecycle settings
    pub worker: WorkerConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Application identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application name, used as the cache name prefix
    pub name: String,

    /// Deployment version (semver). Changing it invalidates old caches.
    pub version: String,

    /// Origin the worker serves (scheme, host and port)
    pub origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "base64-app".to_string(),
            version: "1.0.0".to_string(),
            origin: "http://localhost:3000".to_string(),
        }
    }
}

/// Offline cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Same-origin paths stored on install, in order
    pub static_resources: Vec<String>,

    /// Storage quota in MB (0 = unlimited)
    pub quota_mb: u32,

    /// Path served to document requests when offline and uncached
    pub app_shell: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            static_resources: vec![
                "/".to_string(),
                "/manifest.json".to_string(),
                "/_next/static/css/app/layout.css".to_string(),
                "/_next/static/css/app/page.css".to_string(),
            ],
            quota_mb: 0,
            app_shell: "/".to_string(),
        }
    }
}

impl CacheConfig {
    /// Quota in bytes, `None` when unlimited
    pub fn quota_bytes(&self) -> Option<u64> {
        if self.quota_mb == 0 {
            None
        } else {
            Some(u64::from(self.quota_mb) * 1024 * 1024)
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Worker lifecycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Skip the waiting phase as soon as install succeeds
    pub skip_waiting_on_install: bool,

    /// Take control of open clients right after activation
    pub claim_clients: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            skip_waiting_on_install: true,
            claim_clients: true,
        }
    }
}
