//! Versioned cache naming
//!
//! Every deployment version owns exactly one store, named
//! `<app-name>-v<semver>`. Bumping the version is the only way old stores
//! get invalidated.

use crate::error::{B64Error, B64Result};
use semver::Version;
use std::fmt;

/// Name of the store belonging to one deployment version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheName {
    app: String,
    version: Version,
}

impl CacheName {
    /// Build a cache name, validating both parts
    pub fn new(app: &str, version: &str) -> B64Result<Self> {
        if app.is_empty()
            || !app
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(B64Error::InvalidAppName {
                name: app.to_string(),
                reason: "must be non-empty ASCII [A-Za-z0-9._-]".to_string(),
            });
        }

        let version = Version::parse(version.trim_start_matches('v')).map_err(|e| {
            B64Error::InvalidVersion {
                version: version.to_string(),
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            app: app.to_string(),
            version,
        })
    }

    /// Parse a store name back into its parts
    ///
    /// Returns `None` for names that do not follow the convention.
    pub fn parse(name: &str) -> Option<Self> {
        let (app, version) = name.rsplit_once("-v")?;
        Self::new(app, version).ok()
    }

    /// Deployment version
    pub fn version(&self) -> &Version {
        &self.version
    }

}

impl fmt::Display for CacheName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-v{}", self.app, self.version)
    }
}
