//! Local filesystem collaborator backed by `tokio::fs`.

use super::{entry_name, ContentFetcher, DirectoryEntry, DirectoryLister};
use crate::error::ApiError;
use async_trait::async_trait;
use std::path::{Component, Path};
use tracing::debug;

/// Directory segments that are never listed or read.
const SENSITIVE_DIRS: &[&str] = &[".ssh", ".aws", ".gnupg"];

/// Lists and reads the local filesystem.
///
/// Entries are returned sorted by name so that acquisition over a real
/// filesystem is deterministic.
#[derive(Debug, Clone, Default)]
pub struct LocalFs {
    follow_symlinks: bool,
}

impl LocalFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow symlinked directories while listing (off by default).
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }
}

/// Check whether `path` points into a credential directory or at an env file.
pub fn is_sensitive_path(path: &Path) -> bool {
    let in_sensitive_dir = path.components().any(|component| match component {
        Component::Normal(segment) => segment
            .to_str()
            .map(|s| SENSITIVE_DIRS.contains(&s))
            .unwrap_or(false),
        _ => false,
    });
    if in_sensitive_dir {
        return true;
    }
    match path.file_name().and_then(|n| n.to_str()) {
        Some(".env") => true,
        Some(name) => name.starts_with(".env.") && name != ".env.example",
        None => false,
    }
}

fn io_unreadable_dir(path: &Path, err: std::io::Error) -> ApiError {
    ApiError::DirectoryUnreadable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

#[async_trait]
impl DirectoryLister for LocalFs {
    async fn list(&self, path: &Path) -> Result<Vec<DirectoryEntry>, ApiError> {
        if is_sensitive_path(path) {
            return Err(ApiError::SensitivePath(path.to_path_buf()));
        }

        let mut reader = tokio::fs::read_dir(path)
            .await
            .map_err(|e| io_unreadable_dir(path, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| io_unreadable_dir(path, e))?
        {
            let id = entry.path();
            let file_type = match entry.file_type().await {
                Ok(t) => t,
                Err(e) => {
                    debug!(path = %id.display(), error = %e, "Skipping entry without file type");
                    continue;
                }
            };

            let is_directory = if file_type.is_symlink() {
                // Resolve the target; dangling links are skipped.
                let target = match tokio::fs::metadata(&id).await {
                    Ok(m) => m,
                    Err(e) => {
                        debug!(path = %id.display(), error = %e, "Skipping dangling symlink");
                        continue;
                    }
                };
                if target.is_dir() && !self.follow_symlinks {
                    debug!(path = %id.display(), "Not following symlinked directory");
                    continue;
                }
                target.is_dir()
            } else {
                file_type.is_dir()
            };

            entries.push(DirectoryEntry {
                name: entry_name(&id),
                id,
                is_directory,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[async_trait]
impl ContentFetcher for LocalFs {
    async fn fetch(&self, path: &Path) -> Result<String, ApiError> {
        if is_sensitive_path(path) {
            return Err(ApiError::SensitivePath(path.to_path_buf()));
        }
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::FileUnreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        String::from_utf8(bytes).map_err(|_| ApiError::FileUnreadable {
            path: path.to_path_buf(),
            reason: "content is not valid UTF-8".to_string(),
        })
    }
}
