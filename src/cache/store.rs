//! A single named store of cached responses

use crate::error::{B64Error, B64Result};
use crate::net::{RequestKey, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// SHA256 of a body, hex encoded
pub fn body_digest(body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hex::encode(hasher.finalize())
}

/// A response as it sits in a store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub response: Response,
    pub cached_at: DateTime<Utc>,
    /// SHA256 of the body at write time
    pub sha256: String,
}

impl CachedResponse {
    /// Wrap a response, stamping time and digest
    pub fn new(response: Response) -> Self {
        let sha256 = body_digest(&response.body);
        Self {
            response,
            cached_at: Utc::now(),
            sha256,
        }
    }

    /// Whether the body still matches its digest
    pub fn is_intact(&self) -> bool {
        body_digest(&self.response.body) == self.sha256
    }

    pub fn size(&self) -> u64 {
        self.response.size()
    }
}

/// Request identity to response map for one deployment version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStore {
    pub name: String,
    pub created_at: DateTime<Utc>,
    entries: BTreeMap<String, CachedResponse>,
}

impl CacheStore {
    /// Create an empty store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            created_at: Utc::now(),
            entries: BTreeMap::new(),
        }
    }

    /// Look up a request identity
    pub fn get(&self, key: &RequestKey) -> Option<&CachedResponse> {
        self.entries.get(&key.as_key())
    }

    /// Insert or replace an entry, returning the replaced one
    pub fn put(&mut self, key: &RequestKey, response: Response) -> Option<CachedResponse> {
        self.entries
            .insert(key.as_key(), CachedResponse::new(response))
    }

    /// Entries in key order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &CachedResponse)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total footprint of all entries
    pub fn size(&self) -> u64 {
        self.entries.values().map(CachedResponse::size).sum()
    }

    /// Footprint of the entry currently stored under `key`
    pub fn entry_size(&self, key: &RequestKey) -> u64 {
        self.get(key).map(CachedResponse::size).unwrap_or(0)
    }

    /// Reject the store if any body no longer matches its digest
    pub fn verify(&self) -> B64Result<()> {
        match self.entries.iter().find(|(_, entry)| !entry.is_intact()) {
            Some((key, _)) => Err(B64Error::CacheCorrupt {
                cache: self.name.clone(),
                key: key.clone(),
            }),
            None => Ok(()),
        }
    }
}
