//! StorageConfig and store path resolution.

use crate::config::xdg;
use crate::error::ApiError;
use crate::store::DEFAULT_FAST_TIER_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_threshold() -> usize {
    DEFAULT_FAST_TIER_THRESHOLD
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Largest value (bytes) kept inline in the fast tier
    #[serde(default = "default_threshold")]
    pub fast_tier_threshold_bytes: usize,

    /// Store directory, relative to the workspace root; None means the XDG data dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the store directory for `workspace_root`.
    pub fn resolve_store_path(&self, workspace_root: &Path) -> Result<PathBuf, ApiError> {
        match &self.store_path {
            Some(path) => Ok(workspace_root.join(path)),
            None => Ok(xdg::workspace_data_dir(workspace_root)?.join("store")),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            fast_tier_threshold_bytes: default_threshold(),
            store_path: None,
        }
    }
}
