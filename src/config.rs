//! Configuration
//!
//! Layered with the `config` crate: built-in defaults, then the global file
//! (`$XDG_CONFIG_HOME/codepack/config.toml`), then the workspace file
//! (`<root>/codepack.toml`), then `CODEPACK__SECTION__KEY` environment
//! variables.

pub mod facade;

pub mod merge {
    pub mod service;
}

pub mod paths {
    pub mod xdg_root;
}

pub mod sources {
    pub mod environment;
    pub mod global_file;
    pub mod workspace_file;
}

pub mod workspace {
    pub mod storage_paths;
}

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::storage_paths::StorageConfig;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::session::SessionOptions;
use crate::tree::BuilderConfig;
use serde::{Deserialize, Serialize};

/// Tree acquisition settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Sibling directory listings in flight at once
    #[serde(default = "default_concurrency")]
    pub listing_concurrency: usize,

    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_max_depth() -> usize {
    64
}

fn default_concurrency() -> usize {
    8
}

fn default_true() -> bool {
    true
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            listing_concurrency: default_concurrency(),
            follow_symlinks: false,
        }
    }
}

/// Concatenation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcatConfig {
    /// File reads in flight at once
    #[serde(default = "default_concurrency")]
    pub fetch_concurrency: usize,

    /// Show paths relative to the tree root in the artifact
    #[serde(default = "default_true")]
    pub relative_paths: bool,
}

impl Default for ConcatConfig {
    fn default() -> Self {
        Self {
            fetch_concurrency: default_concurrency(),
            relative_paths: true,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodepackConfig {
    #[serde(default)]
    pub tree: TreeConfig,

    #[serde(default)]
    pub concat: ConcatConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CodepackConfig {
    /// Reject settings that would stall or misroute every operation.
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if self.tree.max_depth == 0 {
            errors.push("tree.max_depth must be at least 1");
        }
        if self.tree.listing_concurrency == 0 {
            errors.push("tree.listing_concurrency must be at least 1");
        }
        if self.concat.fetch_concurrency == 0 {
            errors.push("concat.fetch_concurrency must be at least 1");
        }
        if self.storage.fast_tier_threshold_bytes == 0 {
            errors.push("storage.fast_tier_threshold_bytes must be at least 1");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ConfigError(errors.join("; ")))
        }
    }

    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            max_depth: self.tree.max_depth,
            listing_concurrency: self.tree.listing_concurrency,
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            builder: self.builder_config(),
            fetch_concurrency: self.concat.fetch_concurrency,
            relative_paths: self.concat.relative_paths,
        }
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to serialize config: {}", e)))
    }
}
