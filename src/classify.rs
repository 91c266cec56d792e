//! Path classification
//!
//! Separates dependency/VCS/build directories (never acquired), binary files
//! (never concatenated) and text files. Classification looks at the path string
//! only; it performs no I/O and never fails.

use std::path::{Component, Path};

/// Directory names pruned from every tree, matched against whole path segments.
const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "bower_components",
    ".git",
    ".svn",
    ".hg",
    ".idea",
    ".vscode",
    "dist",
    "build",
    "out",
    "target",
    "coverage",
    "vendor",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".tox",
    ".next",
    "env",
    "venv",
    ".venv",
];

/// Extensions treated as text (compared lowercase, without the dot).
const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "rst", "py", "js", "mjs", "cjs", "jsx", "ts", "tsx", "vue", "svelte",
    "html", "htm", "css", "scss", "sass", "less", "json", "xml", "yaml", "yml", "toml", "ini",
    "cfg", "conf", "env", "csv", "tsv", "sh", "bash", "zsh", "bat", "ps1", "java", "kt", "kts",
    "scala", "groovy", "gradle", "c", "h", "cpp", "cc", "hpp", "cs", "go", "rs", "rb", "php",
    "swift", "sql", "graphql", "proto", "lua", "r", "dart", "ex", "exs", "erl", "hs", "ml",
    "tf", "lock", "gitignore",
];

/// Extensionless or dotfile names treated as text (compared lowercase).
const TEXT_FILENAMES: &[&str] = &[
    ".cursorrules",
    ".gitignore",
    ".gitattributes",
    ".editorconfig",
    ".env",
    ".env.example",
    ".dockerignore",
    ".npmrc",
    "makefile",
    "dockerfile",
    "procfile",
    "jenkinsfile",
    "gemfile",
    "rakefile",
    "vagrantfile",
    "license",
    "readme",
];

/// Classification outcome for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathClass {
    /// Inside a dependency, VCS, build or cache directory
    Excluded,
    /// Not on the text allow-list; skipped during concatenation
    Binary,
    /// Eligible for concatenation
    Text,
}

impl PathClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathClass::Excluded => "excluded",
            PathClass::Binary => "binary",
            PathClass::Text => "text",
        }
    }
}

/// Classify a path.
pub fn classify(path: &Path) -> PathClass {
    if has_excluded_segment(path) {
        return PathClass::Excluded;
    }
    if is_text_file(path) {
        PathClass::Text
    } else {
        PathClass::Binary
    }
}

/// Check whether any whole segment of `path` is a denylisted directory name.
///
/// `vendor/x.ts` matches; `my-vendor-lib/x.ts` does not.
pub fn has_excluded_segment(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(segment) => segment
            .to_str()
            .map(|s| EXCLUDED_DIRS.iter().any(|dir| s.eq_ignore_ascii_case(dir)))
            .unwrap_or(false),
        _ => false,
    })
}

/// Check the file name against the text allow-lists.
pub fn is_text_file(path: &Path) -> bool {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if name.is_empty() {
        return false;
    }
    if TEXT_FILENAMES.contains(&name.as_str()) {
        return true;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => TEXT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
        None => false,
    }
}
