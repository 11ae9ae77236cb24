//! Versioned response cache
//!
//! Responses are keyed by request identity (method + URL) inside named
//! stores. Each deployment version writes to its own store, and activating
//! a version deletes every other store.
//!
//! # Store Lifecycle
//!
//! | Phase | Effect |
//! |-------|--------|
//! | install | store for the new version created and filled with the app shell |
//! | fetch | same-origin GET misses appended opportunistically |
//! | activate | every store not named for the current version deleted |
//! | clear | all stores removed (storage eviction) |

pub mod name;
pub mod storage;
pub mod store;

pub use name::CacheName;
pub use storage::{CacheStorage, StoreSummary};
pub use store::{body_digest, CacheStore, CachedResponse};

/// Format bytes as human-readable size (e.g., "1.5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
