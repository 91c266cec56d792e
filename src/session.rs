//! Pack session
//!
//! Owns the current tree, its selection and the artifact store. A new
//! `load_root` supersedes any build still in flight; a superseded build never
//! replaces the tree. Toggles queue on one FIFO lock, so each runs to
//! completion, propagation included, before the next one starts. Each
//! committed toggle gets the next revision number and is published to
//! subscribers while the lock is still held, so they see toggles in the
//! order they were applied.

use crate::collaborator::{ContentFetcher, DirectoryLister};
use crate::concat::{ConcatenatedArtifact, ConcatenationFormatter};
use crate::error::ApiError;
use crate::selection::{CheckState, SelectionState};
use crate::store::{ArtifactKey, StorageRecord, TieredStore};
use crate::tree::{BuildGenerations, BuilderConfig, DirectoryTree, DirectoryTreeBuilder, ListingFailure};
use crate::types::NodePath;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};

/// Tunables for one session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub builder: BuilderConfig,
    pub fetch_concurrency: usize,
    /// Show artifact paths relative to the tree root
    pub relative_paths: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            builder: BuilderConfig::default(),
            fetch_concurrency: 8,
            relative_paths: true,
        }
    }
}

/// Outcome of a committed `load_root`.
#[derive(Debug, Clone)]
pub struct LoadedRoot {
    pub tree: Arc<DirectoryTree>,
    pub failures: Vec<ListingFailure>,
}

/// One committed toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChange {
    /// Starts at 1 and increases by one per committed toggle
    pub revision: u64,
    pub path: NodePath,
    pub state: CheckState,
}

/// Selection and its derived views, read under one lock.
#[derive(Debug, Clone)]
pub struct SelectionSnapshot {
    pub revision: u64,
    pub selection: SelectionState,
    pub flattened: Vec<NodePath>,
    pub indeterminate: BTreeSet<NodePath>,
}

#[derive(Default)]
struct SessionState {
    tree: Option<Arc<DirectoryTree>>,
    selection: SelectionState,
    revision: u64,
    subscribers: Vec<mpsc::UnboundedSender<SelectionChange>>,
}

impl SessionState {
    fn publish(&mut self, change: SelectionChange) {
        self.subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }
}

/// Tree, selection and store for one packing workflow.
pub struct PackSession<C> {
    collaborator: Arc<C>,
    store: Arc<TieredStore>,
    options: SessionOptions,
    generations: BuildGenerations,
    state: Mutex<SessionState>,
}

impl<C> PackSession<C>
where
    C: DirectoryLister + ContentFetcher,
{
    pub fn new(collaborator: Arc<C>, store: Arc<TieredStore>) -> Self {
        Self::with_options(collaborator, store, SessionOptions::default())
    }

    pub fn with_options(collaborator: Arc<C>, store: Arc<TieredStore>, options: SessionOptions) -> Self {
        Self {
            collaborator,
            store,
            options,
            generations: BuildGenerations::new(),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn store(&self) -> &Arc<TieredStore> {
        &self.store
    }

    /// Acquire `root` and make it the current tree, clearing the selection.
    ///
    /// Fails with `BuildCancelled` if another `load_root` or `cancel` happened
    /// before this build could commit.
    pub async fn load_root(&self, root: &Path) -> Result<LoadedRoot, ApiError> {
        let token = self.generations.begin();
        let builder = DirectoryTreeBuilder::new(Arc::clone(&self.collaborator))
            .with_config(self.options.builder.clone());
        let built = builder.build_with_token(root, &token).await?;

        let mut state = self.state.lock().await;
        if token.is_stale() {
            debug!(root = %root.display(), generation = token.generation(), "Discarding stale tree");
            return Err(ApiError::BuildCancelled {
                root: root.to_path_buf(),
            });
        }
        let tree = Arc::new(built.tree);
        state.tree = Some(Arc::clone(&tree));
        state.selection = SelectionState::new();
        info!(
            root = %root.display(),
            generation = token.generation(),
            nodes = tree.len(),
            "Tree loaded"
        );

        Ok(LoadedRoot {
            tree,
            failures: built.failures,
        })
    }

    /// Invalidate any build in flight without loading a new root.
    pub fn cancel(&self) {
        self.generations.invalidate();
    }

    pub async fn tree(&self) -> Option<Arc<DirectoryTree>> {
        self.state.lock().await.tree.clone()
    }

    pub async fn selection(&self) -> SelectionState {
        self.state.lock().await.selection.clone()
    }

    /// Toggle `path` and return its new display state.
    pub async fn toggle(&self, path: &Path) -> Result<CheckState, ApiError> {
        let mut state = self.state.lock().await;
        let tree = current_tree(&state, path)?;
        let next = state.selection.toggle(path, &tree)?;
        let check = next
            .check_state(path, &tree)
            .ok_or_else(|| ApiError::PathNotInTree(path.to_path_buf()))?;
        state.selection = next;
        state.revision += 1;
        let revision = state.revision;
        state.publish(SelectionChange {
            revision,
            path: path.to_path_buf(),
            state: check,
        });
        debug!(path = %path.display(), state = ?check, revision, "Toggled");
        Ok(check)
    }

    /// Receive every toggle committed after this call, in commit order.
    pub async fn subscribe(&self) -> mpsc::UnboundedReceiver<SelectionChange> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.state.lock().await.subscribers.push(tx);
        rx
    }

    pub async fn snapshot(&self) -> SelectionSnapshot {
        let state = self.state.lock().await;
        let (flattened, indeterminate) = match &state.tree {
            Some(tree) => (
                state.selection.flatten(tree),
                state.selection.indeterminate(tree),
            ),
            None => (Vec::new(), BTreeSet::new()),
        };
        SelectionSnapshot {
            revision: state.revision,
            selection: state.selection.clone(),
            flattened,
            indeterminate,
        }
    }

    pub async fn check_state(&self, path: &Path) -> Result<CheckState, ApiError> {
        let state = self.state.lock().await;
        let tree = current_tree(&state, path)?;
        state
            .selection
            .check_state(path, &tree)
            .ok_or_else(|| ApiError::PathNotInTree(path.to_path_buf()))
    }

    /// Checked leaves in tree order; empty when no tree is loaded.
    pub async fn flatten(&self) -> Vec<NodePath> {
        let state = self.state.lock().await;
        match &state.tree {
            Some(tree) => state.selection.flatten(tree),
            None => Vec::new(),
        }
    }

    pub async fn indeterminate(&self) -> BTreeSet<NodePath> {
        let state = self.state.lock().await;
        match &state.tree {
            Some(tree) => state.selection.indeterminate(tree),
            None => BTreeSet::new(),
        }
    }

    /// Concatenate the current selection.
    pub async fn concatenate(&self) -> Result<ConcatenatedArtifact, ApiError> {
        let (paths, root) = {
            let state = self.state.lock().await;
            match &state.tree {
                Some(tree) => (
                    state.selection.flatten(tree),
                    Some(tree.root_path().to_path_buf()),
                ),
                None => (Vec::new(), None),
            }
        };

        let formatter = ConcatenationFormatter::new()
            .with_fetch_concurrency(self.options.fetch_concurrency)
            .with_display_root(root.filter(|_| self.options.relative_paths));
        formatter.concatenate(&paths, self.collaborator.as_ref()).await
    }

    /// Store the rendered artifact under `concatenatedFiles`.
    pub async fn persist_artifact(
        &self,
        artifact: &ConcatenatedArtifact,
    ) -> Result<StorageRecord, ApiError> {
        self.store
            .put(ArtifactKey::ConcatenatedFiles.as_str(), &artifact.render())
            .await
    }

    pub async fn load_artifact(&self) -> Result<Option<String>, ApiError> {
        self.store.get(ArtifactKey::ConcatenatedFiles.as_str()).await
    }

    /// Drop the tree, the selection and every stored value.
    pub async fn reset(&self) -> Result<(), ApiError> {
        self.generations.invalidate();
        {
            let mut state = self.state.lock().await;
            state.tree = None;
            state.selection = SelectionState::new();
        }
        let removed = self.store.clear().await?;
        info!(removed, "Session reset");
        Ok(())
    }
}

fn current_tree(state: &SessionState, path: &Path) -> Result<Arc<DirectoryTree>, ApiError> {
    state
        .tree
        .clone()
        .ok_or_else(|| ApiError::PathNotInTree(path.to_path_buf()))
}
