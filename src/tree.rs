//! Directory tree acquisition and indexing
//!
//! A `DirectoryTree` owns the root `TreeNode` plus an index built once at
//! construction: the pre-order node list and, per node, the span of its
//! subtree in that list. Descendant and leaf lookups are slices of the
//! pre-order list, so selection never re-walks the tree.

pub mod builder;
pub mod generation;
pub mod node;

pub use builder::{BuilderConfig, DirectoryTreeBuilder};
pub use generation::{BuildGenerations, BuildToken};
pub use node::{DirectoryNode, FileNode, TreeNode};

use crate::error::ApiError;
use crate::types::NodePath;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;

/// One pre-order slot of the index.
#[derive(Debug, Clone)]
struct IndexedNode {
    id: NodePath,
    is_directory: bool,
    /// Exclusive end of this node's subtree in the pre-order list
    end: usize,
    leaf_count: usize,
}

/// Node counts for a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeStats {
    pub directories: usize,
    pub files: usize,
    pub unreadable_directories: usize,
}

/// Immutable tree snapshot with cached descendant spans.
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    root: TreeNode,
    order: Vec<IndexedNode>,
    positions: HashMap<NodePath, usize>,
    stats: TreeStats,
}

impl DirectoryTree {
    /// Index a tree. Fails if two nodes share an id.
    pub fn new(root: TreeNode) -> Result<Self, ApiError> {
        let mut order = Vec::new();
        let mut positions = HashMap::new();
        let mut stats = TreeStats::default();
        index_node(&root, &mut order, &mut positions, &mut stats)?;
        Ok(Self {
            root,
            order,
            positions,
            stats,
        })
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn root_path(&self) -> &Path {
        self.root.id()
    }

    pub fn stats(&self) -> TreeStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.positions.contains_key(path)
    }

    /// `Some(true)` for directories, `Some(false)` for files, `None` if absent.
    pub fn is_directory(&self, path: &Path) -> Option<bool> {
        self.positions.get(path).map(|&i| self.order[i].is_directory)
    }

    /// All node ids in pre-order (children in listing order).
    pub fn preorder(&self) -> impl Iterator<Item = &NodePath> + '_ {
        self.order.iter().map(|n| &n.id)
    }

    /// All leaf ids in pre-order.
    pub fn leaves(&self) -> impl Iterator<Item = &NodePath> + '_ {
        self.order
            .iter()
            .filter(|n| !n.is_directory)
            .map(|n| &n.id)
    }

    /// Descendants of `path` in pre-order, excluding `path` itself.
    pub fn descendants(&self, path: &Path) -> Option<impl Iterator<Item = &NodePath> + '_> {
        let &start = self.positions.get(path)?;
        let end = self.order[start].end;
        Some(self.order[start + 1..end].iter().map(|n| &n.id))
    }

    /// Leaf descendants of `path` in pre-order; a leaf yields itself.
    pub fn leaf_descendants(&self, path: &Path) -> Option<impl Iterator<Item = &NodePath> + '_> {
        let &start = self.positions.get(path)?;
        let end = self.order[start].end;
        Some(
            self.order[start..end]
                .iter()
                .filter(|n| !n.is_directory)
                .map(|n| &n.id),
        )
    }

    /// Number of leaves under `path` (1 for a leaf).
    pub fn leaf_count(&self, path: &Path) -> Option<usize> {
        self.positions.get(path).map(|&i| self.order[i].leaf_count)
    }

    /// Every node in pre-order as `(id, is_directory, subtree span)`.
    ///
    /// The span is the range of pre-order positions covered by the node's
    /// subtree, itself included; positions match the iteration index.
    pub fn spans(&self) -> impl Iterator<Item = (&NodePath, bool, Range<usize>)> + '_ {
        self.order
            .iter()
            .enumerate()
            .map(|(i, n)| (&n.id, n.is_directory, i..n.end))
    }

    /// Look up the node for `path`, descending only into the child whose span covers it.
    pub fn node(&self, path: &Path) -> Option<&TreeNode> {
        let &target = self.positions.get(path)?;
        let mut current = &self.root;
        while current.id() != path {
            current = current.children().iter().find(|child| {
                self.positions
                    .get(child.id())
                    .map(|&i| i <= target && target < self.order[i].end)
                    .unwrap_or(false)
            })?;
        }
        Some(current)
    }
}

fn index_node(
    node: &TreeNode,
    order: &mut Vec<IndexedNode>,
    positions: &mut HashMap<NodePath, usize>,
    stats: &mut TreeStats,
) -> Result<usize, ApiError> {
    let position = order.len();
    if positions.insert(node.id().clone(), position).is_some() {
        return Err(ApiError::DuplicateNode(node.id().clone()));
    }
    order.push(IndexedNode {
        id: node.id().clone(),
        is_directory: node.is_directory(),
        end: position + 1,
        leaf_count: 0,
    });

    let leaf_count = match node {
        TreeNode::File(_) => {
            stats.files += 1;
            1
        }
        TreeNode::Directory(dir) => {
            stats.directories += 1;
            if dir.error.is_some() {
                stats.unreadable_directories += 1;
            }
            let mut leaves = 0;
            for child in &dir.children {
                leaves += index_node(child, order, positions, stats)?;
            }
            leaves
        }
    };

    order[position].end = order.len();
    order[position].leaf_count = leaf_count;
    Ok(leaf_count)
}

/// A listing that failed during acquisition; the node was kept with no children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFailure {
    pub path: NodePath,
    pub reason: String,
}

/// Result of one acquisition: the tree and the per-directory failures it absorbed.
#[derive(Debug, Clone)]
pub struct BuiltTree {
    pub tree: DirectoryTree,
    pub failures: Vec<ListingFailure>,
}
