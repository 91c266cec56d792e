//! ConfigLoader facade delegating to the merge service.

use super::merge::service::MergeService;
use super::CodepackConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load and validate configuration for a workspace.
    pub fn load(workspace_root: &Path) -> Result<CodepackConfig, ApiError> {
        let config = MergeService::load(workspace_root)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<CodepackConfig, ApiError> {
        let config = MergeService::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit file if given, otherwise workspace discovery.
    pub fn resolve(workspace_root: &Path, config_path: Option<&Path>) -> Result<CodepackConfig, ApiError> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(workspace_root),
        }
    }
}
