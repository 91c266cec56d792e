//! Codepack: select files from a directory tree and pack them into one artifact
//!
//! A directory tree is acquired through a listing collaborator, pruning
//! dependency and build directories. Nodes are selected with tri-state
//! propagation, the selected text files are concatenated into a table of
//! contents plus fenced sections, and the artifact is persisted in a two-tier
//! store that moves large values out of the fast tier transparently.

pub mod classify;
pub mod collaborator;
pub mod concat;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod selection;
pub mod session;
pub mod store;
pub mod tooling;
pub mod tree;
pub mod types;

pub use classify::{classify, PathClass};
pub use collaborator::{ContentFetcher, DirectoryEntry, DirectoryLister, LocalFs};
pub use concat::{ArtifactStats, ConcatenatedArtifact, ConcatenationFormatter, Section, SectionBody};
pub use error::{ApiError, StorageError};
pub use selection::{CheckState, SelectionState};
pub use session::{PackSession, SelectionChange, SelectionSnapshot, SessionOptions};
pub use store::{ArtifactKey, StorageRecord, StorageTier, TieredStore};
pub use tree::{BuildToken, DirectoryTree, DirectoryTreeBuilder, TreeNode};
pub use types::NodePath;
