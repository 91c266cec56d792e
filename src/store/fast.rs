//! Fast tier: small, synchronous key-value storage

use crate::error::StorageError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;

/// Synchronous byte store for small values.
pub trait FastTier: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Fast tier backed by a sled tree.
pub struct SledFastTier {
    tree: sled::Tree,
}

impl SledFastTier {
    const TREE_NAME: &'static str = "fast_tier";

    /// Open (or create) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        Self::from_db(&db)
    }

    pub fn from_db(db: &sled::Db) -> Result<Self, StorageError> {
        Ok(Self {
            tree: db.open_tree(Self::TREE_NAME)?,
        })
    }
}

impl FastTier for SledFastTier {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.tree.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.tree.insert(key.as_bytes(), value)?;
        self.tree.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.tree.remove(key.as_bytes())?;
        self.tree.flush()?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.tree
            .iter()
            .keys()
            .map(|key| {
                let key = key?;
                String::from_utf8(key.to_vec())
                    .map_err(|e| StorageError::Encoding(format!("non UTF-8 key: {}", e)))
            })
            .collect()
    }
}

/// In-memory fast tier.
#[derive(Default)]
pub struct MemoryFastTier {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFastTier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FastTier for MemoryFastTier {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.entries.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
