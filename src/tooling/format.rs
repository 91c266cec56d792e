//! Format trees, store status and pack summaries as text.

use crate::concat::ConcatenatedArtifact;
use crate::store::StorageRecord;
use crate::tree::{DirectoryTree, ListingFailure, TreeNode};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use std::path::Path;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// `1536` -> `1.5 KiB`
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Indented tree listing. Unreadable directories are marked.
pub fn format_tree_text(tree: &DirectoryTree, failures: &[ListingFailure]) -> String {
    let mut out = String::new();
    write_node(&mut out, tree.root(), 0);

    let stats = tree.stats();
    out.push_str(&format!(
        "\n{} directories, {} files",
        stats.directories, stats.files
    ));
    if !failures.is_empty() {
        out.push_str(&format!(", {} unreadable", failures.len()));
    }
    out.push('\n');
    out
}

fn write_node(out: &mut String, node: &TreeNode, depth: usize) {
    let indent = "  ".repeat(depth);
    match node {
        TreeNode::File(file) => {
            out.push_str(&format!("{}{}\n", indent, file.name));
        }
        TreeNode::Directory(dir) => {
            let label = format!("{}/", dir.name);
            match &dir.error {
                Some(reason) => out.push_str(&format!(
                    "{}{} {}\n",
                    indent,
                    label.bold(),
                    format!("[unreadable: {}]", reason).red()
                )),
                None => out.push_str(&format!("{}{}\n", indent, label.bold())),
            }
            for child in &dir.children {
                write_node(out, child, depth + 1);
            }
        }
    }
}

/// Table of stored keys.
pub fn format_store_status_text(records: &[StorageRecord], threshold: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Artifact Store")));
    out.push_str(&format!("  Fast tier threshold: {}\n\n", format_bytes(threshold)));
    if records.is_empty() {
        out.push_str("No stored values.\n");
        return out;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "Tier", "Size"]);
    for record in records {
        table.add_row(vec![
            record.key.clone(),
            record.tier.as_str().to_string(),
            format_bytes(record.size_bytes),
        ]);
    }
    out.push_str(&format!("{}\n", table));
    out
}

/// Summary printed when the artifact goes to a file instead of stdout.
pub fn format_pack_summary(
    artifact: &ConcatenatedArtifact,
    record: Option<&StorageRecord>,
    output: &Path,
) -> String {
    let stats = &artifact.stats;
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Pack")));
    out.push_str(&format!("  Output: {}\n", output.display()));
    out.push_str(&format!("  Files: {}\n", stats.files_included));
    if stats.files_unreadable > 0 {
        out.push_str(&format!(
            "  Unreadable: {}\n",
            stats.files_unreadable.to_string().yellow()
        ));
    }
    if stats.skipped_binary > 0 {
        out.push_str(&format!("  Skipped binary: {}\n", stats.skipped_binary));
    }
    out.push_str(&format!("  Size: {}\n", format_bytes(stats.content_bytes)));
    out.push_str(&format!("  Estimated tokens: {}\n", stats.estimated_tokens));
    if let Some(record) = record {
        out.push_str(&format!("  Stored: {} ({} tier)\n", record.key, record.tier.as_str()));
    }
    out
}
