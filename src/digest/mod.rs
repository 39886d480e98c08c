//! Repository digest rendering
//!
//! The digest is a plain-text summary of the repository (README plus one
//! section per source file) handed to prompt templates as context. It is a
//! pure function of its inputs so repeated runs over an unchanged tree are
//! byte-identical.

use crate::extract::RepoStructure;
use anyhow::{Context, Result};
use std::path::Path;

/// Header of the README section
pub const README_HEADER: &str = "# README Summary:\n";

/// Header of the structural section
pub const STRUCTURE_HEADER: &str = "# Project Structure Summary:\n";

/// Render the digest.
///
/// Paths are emitted in ascending order regardless of how the tree was
/// walked.
pub fn build_digest(structure: &RepoStructure, readme: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();

    let readme = readme.trim();
    if !readme.is_empty() {
        lines.push(README_HEADER);
        lines.push(readme);
        lines.push("\n\n");
    }

    lines.push(STRUCTURE_HEADER);

    let headings: Vec<String> = structure.keys().map(|path| format!("## {}", path)).collect();
    for (heading, summaries) in headings.iter().zip(structure.values()) {
        lines.push(heading);
        lines.extend(summaries.iter().map(String::as_str));
        lines.push("");
    }

    lines.join("\n")
}

/// Read a README file, trimmed; a missing file yields an empty string
pub fn read_readme(path: &Path) -> Result<String> {
    if !path.exists() {
        tracing::debug!("No README at {:?}", path);
        return Ok(String::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read README: {:?}", path))?;

    Ok(content.trim().to_string())
}

/// Write the digest, creating parent directories as needed
pub fn write_digest(path: &Path, digest: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    std::fs::write(path, digest).with_context(|| format!("Failed to write digest: {:?}", path))
}
