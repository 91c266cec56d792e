//! Core types shared across the codepack modules.

use std::path::PathBuf;

/// NodePath: canonical absolute path identifying a tree node
pub type NodePath = PathBuf;

/// BuildGeneration: monotonically increasing tree build counter
pub type BuildGeneration = u64;
