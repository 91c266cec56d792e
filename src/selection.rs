//! Tri-state selection over a `DirectoryTree`.
//!
//! `SelectionState` only stores the set of checked node ids. Every operation
//! takes the tree snapshot explicitly and returns a new state; the
//! indeterminate view is always derived, never stored.

use crate::error::ApiError;
use crate::tree::DirectoryTree;
use crate::types::NodePath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Display state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Checked,
    Unchecked,
    Indeterminate,
}

/// Checked node ids for one tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    checked: BTreeSet<NodePath>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn checked(&self) -> &BTreeSet<NodePath> {
        &self.checked
    }

    pub fn is_checked(&self, path: &Path) -> bool {
        self.checked.contains(path)
    }

    pub fn is_empty(&self) -> bool {
        self.checked.is_empty()
    }

    /// Flip `path`; a directory pushes its new state onto every current descendant.
    ///
    /// A directory with leaves follows its displayed state: `Checked` clears the
    /// subtree, `Unchecked` and `Indeterminate` check all of it. Leaves and
    /// directories without leaves flip their own bit.
    pub fn toggle(&self, path: &Path, tree: &DirectoryTree) -> Result<SelectionState, ApiError> {
        let is_directory = tree
            .is_directory(path)
            .ok_or_else(|| ApiError::PathNotInTree(path.to_path_buf()))?;

        let has_leaves = tree.leaf_count(path).unwrap_or(0) > 0;
        let check = if is_directory && has_leaves {
            self.check_state(path, tree) != Some(CheckState::Checked)
        } else {
            !self.checked.contains(path)
        };
        let mut next = self.clone();
        next.set(path, check);

        if is_directory {
            if let Some(descendants) = tree.descendants(path) {
                for descendant in descendants {
                    next.set(descendant, check);
                }
            }
        }

        Ok(next)
    }

    fn set(&mut self, path: &Path, check: bool) {
        if check {
            self.checked.insert(path.to_path_buf());
        } else {
            self.checked.remove(path);
        }
    }

    /// Checked leaves in tree pre-order.
    pub fn flatten(&self, tree: &DirectoryTree) -> Vec<NodePath> {
        tree.leaves()
            .filter(|leaf| self.checked.contains(leaf.as_path()))
            .cloned()
            .collect()
    }

    /// Directories with some but not all of their leaves checked.
    pub fn indeterminate(&self, tree: &DirectoryTree) -> BTreeSet<NodePath> {
        // prefix[i] = checked leaves among the first i pre-order nodes
        let mut prefix = Vec::with_capacity(tree.len() + 1);
        prefix.push(0usize);
        for (id, is_directory, _) in tree.spans() {
            let hit = !is_directory && self.checked.contains(id.as_path());
            let last = prefix.last().copied().unwrap_or(0);
            prefix.push(last + usize::from(hit));
        }

        tree.spans()
            .filter(|(_, is_directory, _)| *is_directory)
            .filter_map(|(id, _, span)| {
                let total = tree.leaf_count(id)?;
                let checked = prefix[span.end] - prefix[span.start];
                (checked > 0 && checked < total).then(|| id.clone())
            })
            .collect()
    }

    /// Display state for one node, or `None` if it is not in the tree.
    pub fn check_state(&self, path: &Path, tree: &DirectoryTree) -> Option<CheckState> {
        let total = tree.leaf_count(path)?;
        let own = self.checked.contains(path);
        if !tree.is_directory(path)? || total == 0 {
            return Some(if own {
                CheckState::Checked
            } else {
                CheckState::Unchecked
            });
        }

        let checked = tree
            .leaf_descendants(path)?
            .filter(|leaf| self.checked.contains(leaf.as_path()))
            .count();
        Some(match checked {
            0 => CheckState::Unchecked,
            n if n == total => CheckState::Checked,
            _ => CheckState::Indeterminate,
        })
    }

}
