//! Recursive tree acquisition over a `DirectoryLister`.
//!
//! One listing call per directory. Sibling subtrees are acquired concurrently
//! up to `listing_concurrency`, but results are assembled in listing order, so
//! interleaving changes timing and never the resulting shape.

use super::generation::BuildToken;
use super::node::{DirectoryNode, FileNode, TreeNode};
use super::{BuiltTree, DirectoryTree, ListingFailure};
use crate::classify::{classify, PathClass};
use crate::collaborator::{entry_name, DirectoryEntry, DirectoryLister};
use crate::error::ApiError;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Acquisition limits.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Directories deeper than this are kept without being listed (root is depth 0)
    pub max_depth: usize,
    /// Sibling listings in flight at once
    pub listing_concurrency: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_depth: 64,
            listing_concurrency: 8,
        }
    }
}

/// State shared by every recursive step of one build.
struct Acquisition<'a> {
    root: &'a Path,
    token: &'a BuildToken,
    failures: Mutex<Vec<ListingFailure>>,
}

impl Acquisition<'_> {
    fn ensure_current(&self) -> Result<(), ApiError> {
        if self.token.is_stale() {
            return Err(ApiError::BuildCancelled {
                root: self.root.to_path_buf(),
            });
        }
        Ok(())
    }

    fn record_failure(&self, path: &Path, reason: String) {
        self.failures.lock().push(ListingFailure {
            path: path.to_path_buf(),
            reason,
        });
    }

    /// Classification is applied below the root only: a user-chosen root
    /// under e.g. `build/` must not prune its own children.
    fn is_excluded(&self, entry: &DirectoryEntry) -> bool {
        let relative = entry
            .id
            .strip_prefix(self.root)
            .unwrap_or_else(|_| Path::new(&entry.name));
        classify(relative) == PathClass::Excluded
    }
}

/// Builds a `DirectoryTree` from one listing call per directory.
pub struct DirectoryTreeBuilder<L> {
    lister: Arc<L>,
    config: BuilderConfig,
}

impl<L: DirectoryLister> DirectoryTreeBuilder<L> {
    pub fn new(lister: Arc<L>) -> Self {
        Self {
            lister,
            config: BuilderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build a tree that no other build can cancel.
    pub async fn build(&self, root: &Path) -> Result<BuiltTree, ApiError> {
        self.build_with_token(root, &BuildToken::detached()).await
    }

    /// Build a tree, aborting with `BuildCancelled` once `token` goes stale.
    ///
    /// An unreadable root fails the build; any other directory that cannot be
    /// listed is kept as an empty node and reported in `failures`. Listing
    /// errors that are not about one directory abort the build wherever they
    /// occur.
    pub async fn build_with_token(
        &self,
        root: &Path,
        token: &BuildToken,
    ) -> Result<BuiltTree, ApiError> {
        let start = Instant::now();
        let acquisition = Acquisition {
            root,
            token,
            failures: Mutex::new(Vec::new()),
        };

        info!(root = %root.display(), generation = token.generation(), "Acquiring directory tree");

        acquisition.ensure_current()?;
        let entries = self.lister.list(root).await.map_err(|e| match e {
            ApiError::DirectoryUnreadable { .. } => e,
            other if !other.is_per_item() => other,
            other => ApiError::DirectoryUnreadable {
                path: root.to_path_buf(),
                reason: other.to_string(),
            },
        })?;
        acquisition.ensure_current()?;

        let children = self.acquire_children(&acquisition, entries, 1).await?;
        let root_node = TreeNode::Directory(DirectoryNode {
            id: root.to_path_buf(),
            name: entry_name(root),
            children,
            error: None,
        });
        let tree = DirectoryTree::new(root_node)?;

        let mut failures = acquisition.failures.into_inner();
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        let stats = tree.stats();
        info!(
            root = %root.display(),
            directories = stats.directories,
            files = stats.files,
            failures = failures.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Directory tree acquired"
        );

        Ok(BuiltTree { tree, failures })
    }

    fn acquire_children<'a>(
        &'a self,
        acquisition: &'a Acquisition<'a>,
        entries: Vec<DirectoryEntry>,
        depth: usize,
    ) -> BoxFuture<'a, Result<Vec<TreeNode>, ApiError>> {
        async move {
            let mut seen: HashSet<PathBuf> = HashSet::new();
            let kept: Vec<DirectoryEntry> = entries
                .into_iter()
                .filter(|entry| {
                    if acquisition.is_excluded(entry) {
                        debug!(path = %entry.id.display(), "Pruned excluded entry");
                        return false;
                    }
                    if !seen.insert(entry.id.clone()) {
                        warn!(path = %entry.id.display(), "Dropping duplicate listing entry");
                        return false;
                    }
                    true
                })
                .collect();

            let nodes: Vec<Result<TreeNode, ApiError>> = stream::iter(kept)
                .map(|entry| self.acquire_entry(acquisition, entry, depth))
                .buffered(self.config.listing_concurrency.max(1))
                .collect()
                .await;

            nodes.into_iter().collect()
        }
        .boxed()
    }

    fn acquire_entry<'a>(
        &'a self,
        acquisition: &'a Acquisition<'a>,
        entry: DirectoryEntry,
        depth: usize,
    ) -> BoxFuture<'a, Result<TreeNode, ApiError>> {
        async move {
            if !entry.is_directory {
                return Ok(TreeNode::File(FileNode {
                    id: entry.id,
                    name: entry.name,
                }));
            }

            if depth > self.config.max_depth {
                let reason = format!("depth limit of {} reached", self.config.max_depth);
                warn!(path = %entry.id.display(), "Directory not listed: {}", reason);
                acquisition.record_failure(&entry.id, reason.clone());
                return Ok(empty_directory(entry, Some(reason)));
            }

            acquisition.ensure_current()?;
            let listing = self.lister.list(&entry.id).await;
            acquisition.ensure_current()?;

            match listing {
                Ok(grandchildren) => {
                    let children = self
                        .acquire_children(acquisition, grandchildren, depth + 1)
                        .await?;
                    Ok(TreeNode::Directory(DirectoryNode {
                        id: entry.id,
                        name: entry.name,
                        children,
                        error: None,
                    }))
                }
                Err(e) if !e.is_per_item() => Err(e),
                Err(e) => {
                    let reason = match &e {
                        ApiError::DirectoryUnreadable { reason, .. } => reason.clone(),
                        other => other.to_string(),
                    };
                    warn!(path = %entry.id.display(), error = %reason, "Directory listing failed");
                    acquisition.record_failure(&entry.id, reason.clone());
                    Ok(empty_directory(entry, Some(reason)))
                }
            }
        }
        .boxed()
    }
}

fn empty_directory(entry: DirectoryEntry, error: Option<String>) -> TreeNode {
    TreeNode::Directory(DirectoryNode {
        id: entry.id,
        name: entry.name,
        children: Vec::new(),
        error,
    })
}
