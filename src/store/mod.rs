//! Tiered artifact store
//!
//! Values up to the threshold live inline in the fast tier. Larger values go
//! to the bulk tier, and the fast tier keeps a redirect marker recording their
//! size. Callers only see `put`/`get`; the split is invisible to them.

pub mod bulk;
pub mod fast;
pub mod keys;

pub use bulk::{BulkTier, FileBulkTier, MemoryBulkTier};
pub use fast::{FastTier, MemoryFastTier, SledFastTier};
pub use keys::ArtifactKey;

use crate::concurrency::KeyLockManager;
use crate::error::{ApiError, StorageError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default fast-tier threshold: 5 MiB
pub const DEFAULT_FAST_TIER_THRESHOLD: usize = 5 * 1024 * 1024;

/// Which tier holds a key's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageTier {
    Fast,
    Bulk,
}

impl StorageTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageTier::Fast => "fast",
            StorageTier::Bulk => "bulk",
        }
    }
}

/// Where and how large a stored value is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRecord {
    pub key: String,
    pub size_bytes: usize,
    pub tier: StorageTier,
}

/// Fast-tier entry. A redirect can never be mistaken for a stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum FastEntry {
    Inline(String),
    Redirect { size_bytes: usize },
}

impl FastEntry {
    fn encode(&self) -> Result<Vec<u8>, StorageError> {
        Ok(bincode::serialize(self)?)
    }

    fn decode(bytes: &[u8]) -> Result<Self, StorageError> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Two-tier string store keyed by name.
pub struct TieredStore {
    fast: Arc<dyn FastTier>,
    bulk: Arc<dyn BulkTier>,
    threshold: usize,
    locks: KeyLockManager,
}

impl TieredStore {
    pub fn new(fast: Arc<dyn FastTier>, bulk: Arc<dyn BulkTier>, threshold: usize) -> Self {
        Self {
            fast,
            bulk,
            threshold,
            locks: KeyLockManager::new(),
        }
    }

    /// Open the on-disk store: sled fast tier under `fast/`, blobs under `bulk/`.
    pub fn open(path: &Path, threshold: usize) -> Result<Self, ApiError> {
        let fast = SledFastTier::open(&path.join("fast"))?;
        let bulk = FileBulkTier::new(path.join("bulk"));
        debug!(path = %path.display(), threshold, "Opened tiered store");
        Ok(Self::new(Arc::new(fast), Arc::new(bulk), threshold))
    }

    pub fn in_memory(threshold: usize) -> Self {
        Self::new(
            Arc::new(MemoryFastTier::new()),
            Arc::new(MemoryBulkTier::new()),
            threshold,
        )
    }

    /// Largest value, in bytes, kept inline in the fast tier.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Store `value` under `key`, replacing any previous value in either tier.
    ///
    /// A value over the threshold must land in the bulk tier; if that fails
    /// the call fails with `StorageCapacityExceeded` and the previous value is
    /// left untouched.
    pub async fn put(&self, key: &str, value: &str) -> Result<StorageRecord, ApiError> {
        let lock = self.locks.get_lock(key);
        let _guard = lock.write().await;

        let size_bytes = value.len();
        if size_bytes <= self.threshold {
            self.fast.put(key, &FastEntry::Inline(value.to_string()).encode()?)?;
            if let Err(e) = self.bulk.remove(key).await {
                warn!(key, error = %e, "Failed to clear stale bulk copy");
            }
            debug!(key, size_bytes, tier = "fast", "Stored value");
            return Ok(StorageRecord {
                key: key.to_string(),
                size_bytes,
                tier: StorageTier::Fast,
            });
        }

        self.bulk
            .put(key, value.as_bytes())
            .await
            .map_err(|e| ApiError::StorageCapacityExceeded {
                key: key.to_string(),
                size_bytes,
                reason: e.to_string(),
            })?;
        self.fast
            .put(key, &FastEntry::Redirect { size_bytes }.encode()?)?;
        info!(key, size_bytes, tier = "bulk", "Stored value");
        Ok(StorageRecord {
            key: key.to_string(),
            size_bytes,
            tier: StorageTier::Bulk,
        })
    }

    /// Value stored under `key`, or `None` if absent.
    pub async fn get(&self, key: &str) -> Result<Option<String>, ApiError> {
        let lock = self.locks.get_lock(key);
        let _guard = lock.read().await;

        let Some(bytes) = self.fast.get(key)? else {
            return Ok(None);
        };
        match FastEntry::decode(&bytes)? {
            FastEntry::Inline(value) => Ok(Some(value)),
            FastEntry::Redirect { size_bytes } => {
                let Some(blob) = self.bulk.get(key).await? else {
                    warn!(key, size_bytes, "Redirect marker without bulk copy");
                    return Ok(None);
                };
                let value = String::from_utf8(blob).map_err(|e| {
                    StorageError::Encoding(format!("bulk value for '{}' is not UTF-8: {}", key, e))
                })?;
                Ok(Some(value))
            }
        }
    }

    /// Tier and size of the value under `key`, without reading a bulk copy.
    pub async fn record(&self, key: &str) -> Result<Option<StorageRecord>, ApiError> {
        let lock = self.locks.get_lock(key);
        let _guard = lock.read().await;

        let Some(bytes) = self.fast.get(key)? else {
            return Ok(None);
        };
        let (size_bytes, tier) = match FastEntry::decode(&bytes)? {
            FastEntry::Inline(value) => (value.len(), StorageTier::Fast),
            FastEntry::Redirect { size_bytes } => (size_bytes, StorageTier::Bulk),
        };
        Ok(Some(StorageRecord {
            key: key.to_string(),
            size_bytes,
            tier,
        }))
    }

    /// Records for every stored key, sorted by key.
    pub async fn records(&self) -> Result<Vec<StorageRecord>, ApiError> {
        let mut keys = self.fast.keys()?;
        keys.sort();
        let mut records = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(record) = self.record(&key).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Remove `key` from both tiers. Returns whether anything was stored.
    pub async fn remove(&self, key: &str) -> Result<bool, ApiError> {
        let lock = self.locks.get_lock(key);
        let _guard = lock.write().await;

        let existed = self.fast.get(key)?.is_some();
        self.fast.remove(key)?;
        self.bulk.remove(key).await?;
        Ok(existed)
    }

    /// Remove every key from both tiers. Returns the number of keys removed.
    pub async fn clear(&self) -> Result<usize, ApiError> {
        let keys = self.fast.keys()?;
        let mut removed = 0;
        for key in &keys {
            if self.remove(key).await? {
                removed += 1;
            }
        }
        self.locks.prune();
        info!(removed, "Cleared tiered store");
        Ok(removed)
    }

    /// Store a structured value as JSON, tiered like any other value.
    pub async fn put_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<StorageRecord, ApiError> {
        let json = serde_json::to_string(value)
            .map_err(|e| StorageError::Encoding(format!("json encode '{}': {}", key, e)))?;
        self.put(key, &json).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ApiError> {
        match self.get(key).await? {
            Some(json) => {
                let value = serde_json::from_str(&json)
                    .map_err(|e| StorageError::Encoding(format!("json decode '{}': {}", key, e)))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }
}
