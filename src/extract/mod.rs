//! Repository scanning module
//!
//! This module handles turning a source tree into records:
//! - Walking the directory tree (walkdir)
//! - Extracting function definitions (tree-sitter)
//! - Per-file summary lines for the repository digest

pub mod code;
mod scan;

pub use code::{FunctionExtractor, FunctionRecord, NO_DOCSTRING};
pub use scan::{read_records, scan, write_records, RepoStructure, ScanOptions, ScanResult};

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension of the files the scanner parses
pub const SOURCE_EXTENSION: &str = "py";

/// Errors that abort a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan root does not exist or is not a directory: {0:?}")]
    RootNotFound(PathBuf),

    #[error("failed to initialize parser: {0}")]
    Parser(String),
}

/// A single source file that could not be parsed.
///
/// Scoped to one file; the scan logs it and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} in {path} at line {line}, column {column}")]
pub struct ScanParseError {
    pub path: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ScanParseError {
    pub fn new(path: &Path, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string_lossy().to_string(),
            line,
            column,
            message: message.into(),
        }
    }
}
