//! Named cache stores with an optional quota and on-disk persistence
//!
//! Stores keep their creation order, which is also the order `match_any`
//! searches them in. Reads take a shared lock, so concurrent fetch handlers
//! never block each other on lookups.

use crate::cache::store::{CacheStore, CachedResponse};
use crate::config::write_atomic;
use crate::error::{B64Error, B64Result};
use crate::net::{RequestKey, Response};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Summary of one store for listings
#[derive(Debug, Clone)]
pub struct StoreSummary {
    pub name: String,
    pub entries: usize,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// All cache stores for one origin
#[derive(Debug, Default)]
pub struct CacheStorage {
    stores: RwLock<Vec<CacheStore>>,
    quota_bytes: Option<u64>,
    dir: Option<PathBuf>,
}

impl CacheStorage {
    /// Create an empty in-memory storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total size of all stores
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Load every `*.json` store from `dir`; `persist` writes back there
    ///
    /// A store file that cannot be read or fails verification is skipped and
    /// treated as evicted. The next `persist` removes it.
    pub async fn open_dir(dir: &Path) -> B64Result<Self> {
        fs::create_dir_all(dir)
            .await
            .map_err(|e| B64Error::io(format!("creating cache directory {}", dir.display()), e))?;

        let mut stores = Vec::new();
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| B64Error::io("reading cache directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| B64Error::io("reading cache entry", e))?
        {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }

            match load_store(&path).await {
                Ok(store) => {
                    debug!("Loaded cache {} ({} entries)", store.name, store.len());
                    stores.push(store);
                }
                Err(e) => warn!("Dropping unreadable cache file {}: {}", path.display(), e),
            }
        }

        stores.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(Self {
            stores: RwLock::new(stores),
            quota_bytes: None,
            dir: Some(dir.to_path_buf()),
        })
    }

    /// Open a store, creating it if missing. Returns `true` if it was created.
    pub async fn open(&self, name: &str) -> bool {
        let mut stores = self.stores.write().await;
        if stores.iter().any(|s| s.name == name) {
            return false;
        }
        stores.push(CacheStore::new(name));
        debug!("Created cache {}", name);
        true
    }

    /// Whether a store exists
    pub async fn has(&self, name: &str) -> bool {
        self.stores.read().await.iter().any(|s| s.name == name)
    }

    /// Names of all stores, in creation order
    pub async fn keys(&self) -> Vec<String> {
        self.stores
            .read()
            .await
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    /// Delete a store. Returns `false` if it did not exist.
    pub async fn delete(&self, name: &str) -> bool {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|s| s.name != name);
        stores.len() != before
    }

    /// Delete every store, returning how many were removed
    pub async fn clear(&self) -> usize {
        let mut stores = self.stores.write().await;
        let removed = stores.len();
        stores.clear();
        removed
    }

    /// Look up a request in one store
    pub async fn match_in(&self, name: &str, key: &RequestKey) -> Option<Response> {
        let stores = self.stores.read().await;
        stores
            .iter()
            .find(|s| s.name == name)
            .and_then(|s| s.get(key))
            .map(|entry| entry.response.clone())
    }

    /// Look up a request across all stores, oldest store first
    pub async fn match_any(&self, key: &RequestKey) -> Option<Response> {
        let stores = self.stores.read().await;
        stores
            .iter()
            .find_map(|s| s.get(key))
            .map(|entry| entry.response.clone())
    }

    /// Store one response
    pub async fn put(&self, name: &str, key: &RequestKey, response: Response) -> B64Result<()> {
        self.put_all(name, vec![(key.clone(), response)]).await
    }

    /// Store several responses atomically: either all are written or none
    pub async fn put_all(
        &self,
        name: &str,
        entries: Vec<(RequestKey, Response)>,
    ) -> B64Result<()> {
        let mut stores = self.stores.write().await;
        let total: u64 = stores.iter().map(CacheStore::size).sum();

        let index = stores
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| B64Error::CacheNotFound(name.to_string()))?;

        if let Some(quota) = self.quota_bytes {
            let store = &stores[index];
            let mut seen = HashSet::new();
            let mut freed = 0u64;
            let mut added = 0u64;
            for (key, response) in &entries {
                if seen.insert(key.as_key()) {
                    freed += store.entry_size(key);
                }
                added += CachedResponse::new(response.clone()).size();
            }
            let after = total.saturating_sub(freed) + added;
            if after > quota {
                return Err(B64Error::QuotaExceeded {
                    needed: after,
                    available: quota,
                });
            }
        }

        let store = &mut stores[index];
        for (key, response) in entries {
            store.put(&key, response);
        }
        Ok(())
    }

    /// Clone of every entry in one store, in key order
    pub async fn entries(&self, name: &str) -> B64Result<Vec<(String, CachedResponse)>> {
        let stores = self.stores.read().await;
        let store = stores
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| B64Error::CacheNotFound(name.to_string()))?;
        Ok(store
            .entries()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect())
    }

    /// Per-store summaries, in creation order
    pub async fn summaries(&self) -> Vec<StoreSummary> {
        self.stores
            .read()
            .await
            .iter()
            .map(|s| StoreSummary {
                name: s.name.clone(),
                entries: s.len(),
                size_bytes: s.size(),
                created_at: s.created_at,
            })
            .collect()
    }

    /// Write every store to the persistence directory and drop files of
    /// deleted stores. No-op for in-memory storage.
    pub async fn persist(&self) -> B64Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };

        let stores = self.stores.read().await;
        let mut live = HashSet::new();
        for store in stores.iter() {
            let path = store_path(dir, &store.name);
            let content = serde_json::to_string(store)?;
            write_atomic(&path, content)
                .await
                .map_err(|e| B64Error::io(format!("writing cache file {}", path.display()), e))?;
            live.insert(path);
        }

        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| B64Error::io("reading cache directory", e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| B64Error::io("reading cache entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") && !live.contains(&path) {
                if let Err(e) = fs::remove_file(&path).await {
                    warn!("Failed to remove stale cache file {}: {}", path.display(), e);
                }
            }
        }

        Ok(())
    }
}

async fn load_store(path: &Path) -> B64Result<CacheStore> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| B64Error::io(format!("reading cache file {}", path.display()), e))?;
    let store: CacheStore = serde_json::from_str(&content)?;
    store.verify()?;
    Ok(store)
}

fn store_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}
