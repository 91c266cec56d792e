//! Shared fixtures

use async_trait::async_trait;
use codepack::collaborator::{ContentFetcher, DirectoryEntry, DirectoryLister};
use codepack::tree::{DirectoryNode, FileNode, TreeNode};
use codepack::ApiError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// In-memory filesystem whose operations complete after per-path delays.
#[derive(Default, Clone)]
pub struct FakeFs {
    pub listings: HashMap<PathBuf, Vec<DirectoryEntry>>,
    pub contents: HashMap<PathBuf, String>,
    pub delays_ms: HashMap<PathBuf, u64>,
}

impl FakeFs {
    pub fn dir(mut self, path: &str, entries: Vec<DirectoryEntry>) -> Self {
        self.listings.insert(PathBuf::from(path), entries);
        self
    }

    pub fn file(mut self, path: &str, content: &str) -> Self {
        self.contents.insert(PathBuf::from(path), content.to_string());
        self
    }

    pub fn delay(mut self, path: &str, ms: u64) -> Self {
        self.delays_ms.insert(PathBuf::from(path), ms);
        self
    }

    async fn wait(&self, path: &Path) {
        if let Some(ms) = self.delays_ms.get(path) {
            tokio::time::sleep(Duration::from_millis(*ms)).await;
        }
    }
}

#[async_trait]
impl DirectoryLister for FakeFs {
    async fn list(&self, path: &Path) -> Result<Vec<DirectoryEntry>, ApiError> {
        self.wait(path).await;
        self.listings
            .get(path)
            .cloned()
            .ok_or_else(|| ApiError::DirectoryUnreadable {
                path: path.to_path_buf(),
                reason: "no such directory".to_string(),
            })
    }
}

#[async_trait]
impl ContentFetcher for FakeFs {
    async fn fetch(&self, path: &Path) -> Result<String, ApiError> {
        self.wait(path).await;
        self.contents
            .get(path)
            .cloned()
            .ok_or_else(|| ApiError::FileUnreadable {
                path: path.to_path_buf(),
                reason: "no such file".to_string(),
            })
    }
}

/// Generated tree shape; ids are assigned when materialized.
#[derive(Debug, Clone)]
pub enum Shape {
    File,
    Dir(Vec<Shape>),
}

pub fn materialize(shape: &Shape, id: PathBuf) -> TreeNode {
    let name = id
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| id.display().to_string());
    match shape {
        Shape::File => TreeNode::File(FileNode { id, name }),
        Shape::Dir(children) => TreeNode::Directory(DirectoryNode {
            children: children
                .iter()
                .enumerate()
                .map(|(i, child)| {
                    let suffix = if matches!(child, Shape::File) { ".rs" } else { "" };
                    materialize(child, id.join(format!("n{}{}", i, suffix)))
                })
                .collect(),
            id,
            name,
            error: None,
        }),
    }
}

/// Register a materialized tree as listings and contents on a `FakeFs`.
pub fn register(fs: &mut FakeFs, node: &TreeNode) {
    match node {
        TreeNode::File(file) => {
            fs.contents
                .insert(file.id.clone(), format!("// {}", file.name));
        }
        TreeNode::Directory(dir) => {
            let entries = dir
                .children
                .iter()
                .map(|child| DirectoryEntry {
                    id: child.id().clone(),
                    name: child.name().to_string(),
                    is_directory: child.is_directory(),
                })
                .collect();
            fs.listings.insert(dir.id.clone(), entries);
            for child in &dir.children {
                register(fs, child);
            }
        }
    }
}
