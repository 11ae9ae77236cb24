//! Error types for b64shell
//!
//! All modules use `B64Result<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for b64shell operations
pub type B64Result<T> = Result<T, B64Error>;

/// All errors that can occur in b64shell
#[derive(Error, Debug)]
pub enum B64Error {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid app name '{name}': {reason}")]
    InvalidAppName { name: String, reason: String },

    #[error("Invalid deployment version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // Codec errors
    #[error("Invalid Base64 string: {0}")]
    InvalidBase64(String),

    #[error("Decoded Base64 is not valid UTF-8 text")]
    InvalidUtf8,

    #[error("Not a Base64 Data URI: {0}")]
    InvalidDataUri(String),

    // Network errors
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Request to {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    // Cache errors
    #[error("Cache quota exceeded: {needed} bytes needed, {available} bytes available")]
    QuotaExceeded { needed: u64, available: u64 },

    #[error("Cache not found: {0}")]
    CacheNotFound(String),

    #[error("Cache entry corrupt in {cache}: {key}")]
    CacheCorrupt { cache: String, key: String },

    // Worker errors
    #[error("No handler registered for {0} events")]
    NoHandler(String),

    #[error("Invalid worker state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid message payload: {0}")]
    InvalidMessage(String),

    #[error("No waiting worker to activate")]
    NoWaitingWorker,

    #[error("Offline and no cached app shell for {0}")]
    OfflineFallbackMissing(String),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl B64Error {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidAppName { .. } => Some("Set app.name using only ASCII letters, digits, '.', '_' or '-'"),
            Self::InvalidVersion { .. } => Some("Set app.version to a semantic version, e.g. 1.0.0"),
            Self::QuotaExceeded { .. } => Some("Raise cache.quota_mb or run: b64shell cache clear"),
            Self::NoWaitingWorker => Some("Run: b64shell worker update"),
            Self::OfflineFallbackMissing(_) => {
                Some("Install the app shell while online: b64shell worker update")
            }
            Self::InvalidDataUri(_) => Some("Expected data:<mime>;base64,<payload>"),
            Self::InvalidUtf8 => Some("Use --output to write the raw bytes to a file"),
            _ => None,
        }
    }
}
