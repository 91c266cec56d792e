//! Concatenation formatter
//!
//! Turns an ordered list of selected leaf paths into one artifact: a table of
//! contents followed by one fenced section per file. Binary paths are dropped,
//! repeated paths appear once, and fetches run with bounded concurrency while
//! sections keep input order.

pub mod language;

pub use language::{language_for, DEFAULT_LANGUAGE};

use crate::classify::is_text_file;
use crate::collaborator::ContentFetcher;
use crate::error::ApiError;
use crate::types::NodePath;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Placeholder emitted in place of a file that could not be read.
pub const UNREADABLE_PLACEHOLDER: &str = "[Error reading file]";

/// Section body: fetched content, or the reason the fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum SectionBody {
    Content(String),
    Unreadable(String),
}

/// One file section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub path: NodePath,
    pub language: String,
    pub body: SectionBody,
}

impl Section {
    pub fn is_readable(&self) -> bool {
        matches!(self.body, SectionBody::Content(_))
    }
}

/// Counters describing one concatenation. Not part of the rendered text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactStats {
    pub files_included: usize,
    pub files_unreadable: usize,
    pub skipped_binary: usize,
    pub duplicates_removed: usize,
    pub content_bytes: usize,
    /// Rough size for context budgeting: characters / 4
    pub estimated_tokens: usize,
}

/// Concatenated artifact.
///
/// `table_of_contents` and `sections` list the same paths in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatenatedArtifact {
    pub table_of_contents: Vec<NodePath>,
    pub sections: Vec<Section>,
    /// When set, rendered paths are shown relative to this directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_root: Option<PathBuf>,
    pub stats: ArtifactStats,
}

impl ConcatenatedArtifact {
    /// Path as it appears in headings and the table of contents.
    pub fn display_path(&self, path: &Path) -> String {
        let shown = self
            .display_root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .filter(|relative| !relative.as_os_str().is_empty())
            .unwrap_or(path);
        shown.display().to_string()
    }

    /// Serialize to the artifact text. Same structure, same bytes.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.stats.content_bytes + 256);
        out.push_str("## Table of Contents\n\n");
        for path in &self.table_of_contents {
            let _ = writeln!(out, "- {}", self.display_path(path));
        }
        out.push_str("\n---\n\n");

        for section in &self.sections {
            let _ = write!(out, "## File: {}\n\n", self.display_path(&section.path));
            match &section.body {
                SectionBody::Content(content) => {
                    let fence = fence_for(content);
                    let _ = write!(
                        out,
                        "{fence}{}\n{}\n{fence}\n\n",
                        section.language,
                        content,
                        fence = fence
                    );
                }
                SectionBody::Unreadable(_) => {
                    let _ = write!(out, "{}\n\n", UNREADABLE_PLACEHOLDER);
                }
            }
        }
        out
    }
}

/// Backtick fence longer than any backtick run in `content`, at least three.
pub fn fence_for(content: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for c in content.chars() {
        if c == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    "`".repeat((longest + 1).max(3))
}

/// Formatter settings plus the concatenation operation.
#[derive(Debug, Clone)]
pub struct ConcatenationFormatter {
    fetch_concurrency: usize,
    display_root: Option<PathBuf>,
}

impl Default for ConcatenationFormatter {
    fn default() -> Self {
        Self {
            fetch_concurrency: 8,
            display_root: None,
        }
    }
}

impl ConcatenationFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum fetches in flight; clamped to at least one.
    pub fn with_fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        self.fetch_concurrency = fetch_concurrency.max(1);
        self
    }

    pub fn with_display_root(mut self, root: Option<PathBuf>) -> Self {
        self.display_root = root;
        self
    }

    pub fn fetch_concurrency(&self) -> usize {
        self.fetch_concurrency
    }

    /// Build the artifact for `paths` in the given order.
    ///
    /// A fetch that fails for that file alone becomes a placeholder section;
    /// any other fetch error is returned as is. Fails with
    /// `ConcatenationFailed` when no eligible file could be read, which
    /// includes an empty or all-binary input.
    pub async fn concatenate<F>(
        &self,
        paths: &[NodePath],
        fetcher: &F,
    ) -> Result<ConcatenatedArtifact, ApiError>
    where
        F: ContentFetcher + ?Sized,
    {
        let started = Instant::now();
        let mut stats = ArtifactStats::default();

        let mut seen = HashSet::new();
        let mut eligible: Vec<&NodePath> = Vec::with_capacity(paths.len());
        for path in paths {
            if !is_text_file(path) {
                stats.skipped_binary += 1;
                debug!(path = %path.display(), "Skipping binary file");
                continue;
            }
            if !seen.insert(path.as_path()) {
                stats.duplicates_removed += 1;
                continue;
            }
            eligible.push(path);
        }

        // `buffered` yields in input order regardless of completion order
        let fetched: Vec<(&NodePath, Result<String, ApiError>)> = stream::iter(eligible)
            .map(|path| async move { (path, fetcher.fetch(path).await) })
            .buffered(self.fetch_concurrency)
            .collect()
            .await;

        let mut table_of_contents = Vec::with_capacity(fetched.len());
        let mut sections = Vec::with_capacity(fetched.len());
        let mut chars = 0usize;
        for (path, result) in fetched {
            let body = match result {
                Ok(content) => {
                    stats.files_included += 1;
                    stats.content_bytes += content.len();
                    chars += content.chars().count();
                    SectionBody::Content(content)
                }
                Err(e) if !e.is_per_item() => {
                    warn!(path = %path.display(), error = %e, "Fetch failed, aborting concatenation");
                    return Err(e);
                }
                Err(e) => {
                    stats.files_unreadable += 1;
                    warn!(path = %path.display(), error = %e, "Failed to read selected file");
                    SectionBody::Unreadable(e.to_string())
                }
            };
            table_of_contents.push(path.clone());
            sections.push(Section {
                path: path.clone(),
                language: language_for(path).to_string(),
                body,
            });
        }
        stats.estimated_tokens = chars / 4;

        if stats.files_included == 0 {
            return Err(ApiError::ConcatenationFailed {
                attempted: sections.len(),
            });
        }

        info!(
            files = stats.files_included,
            unreadable = stats.files_unreadable,
            skipped_binary = stats.skipped_binary,
            duplicates = stats.duplicates_removed,
            bytes = stats.content_bytes,
            tokens = stats.estimated_tokens,
            duration_ms = started.elapsed().as_millis() as u64,
            "Concatenation complete"
        );

        Ok(ConcatenatedArtifact {
            table_of_contents,
            sections,
            display_root: self.display_root.clone(),
            stats,
        })
    }
}
