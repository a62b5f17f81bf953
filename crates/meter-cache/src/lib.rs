// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//! Two-tier dashboard cache: an in-process memory map for the fast path,
//! backed by a file tier written atomically via tmp-rename so concurrent
//! readers never observe a partial file.
//!
//! Grounded on the in-process LRU image cache's `OnceLock<Mutex<...>>`
//! pattern, generalized from a fixed-capacity LRU to a plain TTL map since
//! the dashboard cache has no bounded-memory requirement in the spec.

mod key;

pub use key::CacheKey;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheMeta {
    schema: u32,
    build: String,
    created_at: DateTime<Utc>,
    ttl_sec: u64,
    key: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEnvelope<T> {
    meta: CacheMeta,
    data: T,
}

struct MemoryEntry {
    json: String,
    inserted_at: Instant,
}

/// A cached read result, tagged with whether it was served from cache.
#[derive(Debug, Clone)]
pub struct CachedValue<T> {
    pub cached: bool,
    pub data: T,
}

/// The dashboard cache. One instance is shared across the process.
pub struct DashboardCache {
    memory: Mutex<HashMap<String, MemoryEntry>>,
    dir: PathBuf,
    ttl: Duration,
    schema_version: u32,
    build_id: String,
}

impl DashboardCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration, schema_version: u32, build_id: impl Into<String>) -> Self {
        Self {
            memory: Mutex::new(HashMap::new()),
            dir: dir.into(),
            ttl,
            schema_version,
            build_id: build_id.into(),
        }
    }

    fn file_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.digest(self.schema_version, &self.build_id)))
    }

    /// Memory-tier fast path, then file tier; `None` on a clean miss.
    pub fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let canonical = key.canonical();
        if let Some(entry) = self.memory.lock().unwrap().get(&canonical) {
            if entry.inserted_at.elapsed() < self.ttl {
                if let Ok(envelope) = serde_json::from_str::<CacheEnvelope<T>>(&entry.json) {
                    return Some(envelope.data);
                }
            }
        }

        let path = self.file_path(key);
        let raw = std::fs::read_to_string(&path).ok()?;
        let envelope: CacheEnvelope<T> = serde_json::from_str(&raw).ok()?;
        if envelope.meta.schema != self.schema_version || envelope.meta.build != self.build_id {
            return None;
        }
        let age = Utc::now().signed_duration_since(envelope.meta.created_at);
        if age.num_seconds() < 0 || age.num_seconds() as u64 > envelope.meta.ttl_sec {
            return None;
        }
        self.memory.lock().unwrap().insert(canonical, MemoryEntry { json: raw, inserted_at: Instant::now() });
        Some(envelope.data)
    }

    /// Fills both tiers. The file write is tmp-then-rename so a concurrent
    /// reader never sees a half-written file.
    pub fn put<T: Serialize>(&self, key: &CacheKey, data: T) -> Result<(), CacheError> {
        let envelope = CacheEnvelope {
            meta: CacheMeta {
                schema: self.schema_version,
                build: self.build_id.clone(),
                created_at: Utc::now(),
                ttl_sec: self.ttl.as_secs(),
                key: key.canonical(),
            },
            data,
        };
        let json = serde_json::to_string(&envelope)?;

        std::fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        use std::io::Write;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(self.file_path(key)).map_err(|e| e.error)?;

        self.memory.lock().unwrap().insert(key.canonical(), MemoryEntry { json, inserted_at: Instant::now() });
        Ok(())
    }

    /// Computes via `miss` on a cache miss, fills both tiers, and reports
    /// whether the read was served from cache.
    pub fn get_or_compute<T, F>(&self, key: &CacheKey, miss: F) -> Result<CachedValue<T>, CacheError>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnOnce() -> T,
    {
        if let Some(data) = self.get::<T>(key) {
            return Ok(CachedValue { cached: true, data });
        }
        let data = miss();
        self.put(key, data.clone())?;
        Ok(CachedValue { cached: false, data })
    }

    /// Removes a single key from both tiers.
    pub fn invalidate(&self, key: &CacheKey) {
        self.memory.lock().unwrap().remove(&key.canonical());
        let _ = std::fs::remove_file(self.file_path(key));
    }

    /// Total purge: clears the memory map and deletes every file under the
    /// cache directory.
    pub fn purge_all(&self) -> Result<(), CacheError> {
        self.memory.lock().unwrap().clear();
        if !self.dir.exists() {
            return Ok(());
        }
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.path().extension().and_then(|e| e.to_str()) == Some("json") {
                let _ = std::fs::remove_file(entry.path());
            }
        }
        Ok(())
    }
}
