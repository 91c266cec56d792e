//! External collaborators: directory listing and file content.
//!
//! The core never touches the filesystem directly. It consumes one listing call
//! per directory and one content call per file through these traits. The
//! response DTOs below are the JSON shape of both calls' results.

pub mod local;

use crate::error::ApiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use local::LocalFs;

/// One immediate child returned by a listing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: PathBuf,
    pub name: String,
    pub is_directory: bool,
}

impl DirectoryEntry {
    pub fn file(id: impl Into<PathBuf>) -> Self {
        let id = id.into();
        let name = entry_name(&id);
        Self {
            id,
            name,
            is_directory: false,
        }
    }

    pub fn directory(id: impl Into<PathBuf>) -> Self {
        let id = id.into();
        let name = entry_name(&id);
        Self {
            id,
            name,
            is_directory: true,
        }
    }
}

/// Last path segment, or the whole path when there is none (e.g. `/`).
pub fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Lists the immediate children of a directory.
#[async_trait]
pub trait DirectoryLister: Send + Sync {
    async fn list(&self, path: &Path) -> Result<Vec<DirectoryEntry>, ApiError>;
}

/// Returns the full text content of a file.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, path: &Path) -> Result<String, ApiError>;
}

#[async_trait]
impl<T: DirectoryLister + ?Sized> DirectoryLister for Arc<T> {
    async fn list(&self, path: &Path) -> Result<Vec<DirectoryEntry>, ApiError> {
        (**self).list(path).await
    }
}

#[async_trait]
impl<T: ContentFetcher + ?Sized> ContentFetcher for Arc<T> {
    async fn fetch(&self, path: &Path) -> Result<String, ApiError> {
        (**self).fetch(path).await
    }
}

// --- Wire DTOs ---

/// Listing response: `{ "success", "entries"?, "error"? }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<DirectoryEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ListingResponse {
    pub fn from_result(result: Result<Vec<DirectoryEntry>, ApiError>) -> Self {
        match result {
            Ok(entries) => Self {
                success: true,
                entries: Some(entries),
                error: None,
            },
            Err(e) => Self {
                success: false,
                entries: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Interpret the response for the directory at `path`.
    ///
    /// A successful response without entries is an empty directory.
    pub fn into_result(self, path: &Path) -> Result<Vec<DirectoryEntry>, ApiError> {
        if self.success {
            Ok(self.entries.unwrap_or_default())
        } else {
            Err(ApiError::DirectoryUnreadable {
                path: path.to_path_buf(),
                reason: self.error.unwrap_or_else(|| "listing failed".to_string()),
            })
        }
    }
}

/// Content response: `{ "success", "content"?, "error"? }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContentResponse {
    pub fn from_result(result: Result<String, ApiError>) -> Self {
        match result {
            Ok(content) => Self {
                success: true,
                content: Some(content),
                error: None,
            },
            Err(e) => Self {
                success: false,
                content: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn into_result(self, path: &Path) -> Result<String, ApiError> {
        match (self.success, self.content) {
            (true, Some(content)) => Ok(content),
            (true, None) => Err(ApiError::FileUnreadable {
                path: path.to_path_buf(),
                reason: "response carried no content".to_string(),
            }),
            (false, _) => Err(ApiError::FileUnreadable {
                path: path.to_path_buf(),
                reason: self.error.unwrap_or_else(|| "read failed".to_string()),
            }),
        }
    }
}
