//! Build-time description of one worker version

use crate::cache::CacheName;
use crate::config::Config;
use crate::error::{B64Error, B64Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Everything a worker version needs: its cache name, origin and app shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheManifest {
    pub app: String,
    pub version: String,
    pub origin: Url,
    /// Same-origin paths stored on install, in order
    pub static_resources: Vec<String>,
    /// Path served to offline document requests
    pub app_shell: String,
    pub skip_waiting_on_install: bool,
    pub claim_clients: bool,
}

#[cfg(test)]
impl Default for CacheManifest {
    fn default() -> Self {
        Self::from_config(&Config::default()).unwrap()
    }
}

impl CacheManifest {
    /// Build and validate a manifest from configuration
    pub fn from_config(config: &Config) -> B64Result<Self> {
        let origin = Url::parse(&config.app.origin).map_err(|e| B64Error::InvalidUrl {
            url: config.app.origin.clone(),
            reason: e.to_string(),
        })?;

        let manifest = Self {
            app: config.app.name.clone(),
            version: config.app.version.clone(),
            origin,
            static_resources: config.cache.static_resources.clone(),
            app_shell: config.cache.app_shell.clone(),
            skip_waiting_on_install: config.worker.skip_waiting_on_install,
            claim_clients: config.worker.claim_clients,
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check the cache name and that every path resolves on the origin
    pub fn validate(&self) -> B64Result<()> {
        self.cache_name()?;
        self.resource_urls()?;
        self.app_shell_url()?;
        Ok(())
    }

    /// Versioned store name
    pub fn cache_name(&self) -> B64Result<CacheName> {
        CacheName::new(&self.app, &self.version)
    }

    /// Store name as a string; falls back to the raw parts if invalid
    pub fn cache_name_string(&self) -> String {
        self.cache_name()
            .map(|name| name.to_string())
            .unwrap_or_else(|_| format!("{}-v{}", self.app, self.version))
    }

    /// Absolute URLs of the static resources
    pub fn resource_urls(&self) -> B64Result<Vec<Url>> {
        self.static_resources
            .iter()
            .map(|path| self.resolve(path))
            .collect()
    }

    /// Absolute URL of the app shell
    pub fn app_shell_url(&self) -> B64Result<Url> {
        self.resolve(&self.app_shell)
    }

    /// Resolve a path against the origin; the result must stay same-origin
    pub fn resolve(&self, path: &str) -> B64Result<Url> {
        let url = self.origin.join(path).map_err(|e| B64Error::InvalidUrl {
            url: path.to_string(),
            reason: e.to_string(),
        })?;
        if url.origin() != self.origin.origin() {
            return Err(B64Error::InvalidUrl {
                url: path.to_string(),
                reason: format!("not on origin {}", self.origin.origin().ascii_serialization()),
            });
        }
        Ok(url)
    }
}
