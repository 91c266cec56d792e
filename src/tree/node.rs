//! Directory tree node types

use crate::types::NodePath;
use serde::{Deserialize, Serialize};

/// File (leaf) node representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileNode {
    pub id: NodePath,
    pub name: String,
}

/// Directory node representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub id: NodePath,
    pub name: String,
    pub children: Vec<TreeNode>, // listing order, never re-sorted
    /// Set when this directory's own listing failed; children are then empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Tree node type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TreeNode {
    File(FileNode),
    Directory(DirectoryNode),
}

impl TreeNode {
    pub fn id(&self) -> &NodePath {
        match self {
            TreeNode::File(f) => &f.id,
            TreeNode::Directory(d) => &d.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TreeNode::File(f) => &f.name,
            TreeNode::Directory(d) => &d.name,
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, TreeNode::Directory(_))
    }

    /// Children in listing order; always empty for files.
    pub fn children(&self) -> &[TreeNode] {
        match self {
            TreeNode::File(_) => &[],
            TreeNode::Directory(d) => &d.children,
        }
    }

    /// Listing failure recorded on this node, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            TreeNode::File(_) => None,
            TreeNode::Directory(d) => d.error.as_deref(),
        }
    }
}
