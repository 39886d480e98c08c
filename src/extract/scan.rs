//! Directory walking and per-file extraction

use super::{FunctionExtractor, FunctionRecord, ScanError, ScanParseError, SOURCE_EXTENSION};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use walkdir::WalkDir;

/// Relative file path -> summary lines, iterated in path order
pub type RepoStructure = BTreeMap<String, Vec<String>>;

/// Options controlling which parts of the tree are visited
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Directory or file names (simple `*` globs) that are never visited
    pub ignore_patterns: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

pub(crate) fn default_ignore_patterns() -> Vec<String> {
    vec![
        ".git".to_string(),
        "__pycache__".to_string(),
        ".venv".to_string(),
        "venv".to_string(),
        "node_modules".to_string(),
        "*.egg-info".to_string(),
    ]
}

impl ScanOptions {
    /// Check if a path component should be skipped
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore_patterns
            .iter()
            .any(|pattern| glob_match_simple(pattern, name))
    }
}

/// Output of a repository scan
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Every function found, files in walk order, functions in source order
    pub records: Vec<FunctionRecord>,
    /// Summary lines for files that produced at least one record
    pub structure: RepoStructure,
    /// Files that were skipped because they could not be read or parsed
    pub skipped: Vec<ScanParseError>,
}

/// Scan a directory tree for Python functions.
///
/// Only a missing root is fatal; unreadable or unparsable files are logged,
/// recorded in [`ScanResult::skipped`] and the walk continues.
pub fn scan(root: &Path, options: &ScanOptions) -> std::result::Result<ScanResult, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }

    let mut extractor =
        FunctionExtractor::new().map_err(|e| ScanError::Parser(e.to_string()))?;
    let mut result = ScanResult::default();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !options.is_ignored(&entry.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let path = entry.path();
        let is_source = path.extension().and_then(|e| e.to_str()) == Some(SOURCE_EXTENSION);
        if !entry.file_type().is_file() || !is_source {
            continue;
        }

        let relative = relative_path(root, path);

        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Failed to read {:?}: {}", path, e);
                result
                    .skipped
                    .push(ScanParseError::new(path, 0, 0, format!("unreadable: {}", e)));
                continue;
            }
        };

        match extractor.extract_source(path, &source) {
            Ok(records) => {
                tracing::debug!("{}: {} function(s)", relative, records.len());

                if !records.is_empty() {
                    let summaries = records.iter().map(FunctionRecord::summary_line).collect();
                    result.structure.insert(relative, summaries);
                    result.records.extend(records);
                }
            }
            Err(e) => {
                tracing::warn!("Syntax error in {:?}: {}", path, e);
                result.skipped.push(e);
            }
        }
    }

    tracing::info!(
        "Scanned {} file(s) with functions, {} function(s), {} skipped",
        result.structure.len(),
        result.records.len(),
        result.skipped.len()
    );

    Ok(result)
}

/// Write records as pretty-printed JSON
pub fn write_records(path: &Path, records: &[FunctionRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }

    let content =
        serde_json::to_string_pretty(records).context("Failed to serialize function records")?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write function records: {:?}", path))?;

    Ok(())
}

/// Load records written by [`write_records`]
pub fn read_records(path: &Path) -> Result<Vec<FunctionRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read function records: {:?}", path))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse function records: {:?}", path))
}

/// Path relative to the scan root, always with forward slashes
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Simple glob matching helper, `*` matches any run of characters
fn glob_match_simple(pattern: &str, name: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == name;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let (first, last) = (parts[0], parts[parts.len() - 1]);

    if name.len() < first.len() + last.len() || !name.starts_with(first) || !name.ends_with(last)
    {
        return false;
    }

    let mut rest = &name[first.len()..name.len() - last.len()];

    for middle in &parts[1..parts.len() - 1] {
        match rest.find(middle) {
            Some(at) => rest = &rest[at + middle.len()..],
            None => return false,
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, content: &str) {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_collects_every_function() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "app/__init__.py",
            "def create_app():\n    \"\"\"Build the app.\"\"\"\n    def helper():\n        pass\n    return helper\n",
        );
        write(&dir, "app/models.py", "class User:\n    def save(self):\n        pass\n");
        write(&dir, "app/empty.py", "X = 1\n");
        write(&dir, "README.md", "def not_python(): pass\n");

        let result = scan(dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(result.records.len(), 3);
        assert!(result.records.iter().all(|r| !r.code.is_empty()));
        assert!(result.skipped.is_empty());

        let keys: Vec<&str> = result.structure.keys().map(String::as_str).collect();
        assert_eq!(keys, ["app/__init__.py", "app/models.py"]);
        assert_eq!(
            result.structure["app/__init__.py"],
            ["- create_app: Build the app.", "- helper: (no docstring)"]
        );
    }

    #[test]
    fn test_bad_file_is_isolated() {
        let dir = TempDir::new().unwrap();
        write(&dir, "a.py", "def first():\n    pass\n");
        write(&dir, "b.py", "def broken(:\n");
        write(&dir, "c.py", "def last():\n    pass\n");

        let result = scan(dir.path(), &ScanOptions::default()).unwrap();

        let names: Vec<&str> = result.records.iter().map(|r| r.function.as_str()).collect();
        assert_eq!(names, ["first", "last"]);
        assert_eq!(result.skipped.len(), 1);
        assert!(result.skipped[0].path.ends_with("b.py"));
    }

    #[test]
    fn test_non_utf8_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("latin.py"), b"# \xff\xfe\ndef f():\n    pass\n").unwrap();
        write(&dir, "ok.py", "def g():\n    pass\n");

        let result = scan(dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.skipped.len(), 1);
    }

    #[test]
    fn test_ignored_directories_are_not_visited() {
        let dir = TempDir::new().unwrap();
        write(&dir, ".venv/lib/site.py", "def vendored():\n    pass\n");
        write(&dir, "pkg/__pycache__/x.py", "def cached():\n    pass\n");
        write(&dir, "pkg/mod.py", "def kept():\n    pass\n");

        let result = scan(dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].function, "kept");
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = scan(&dir.path().join("nope"), &ScanOptions::default()).unwrap_err();

        assert!(matches!(err, ScanError::RootNotFound(_)));
    }

    #[test]
    fn test_records_file_round_trip() {
        let dir = TempDir::new().unwrap();
        write(&dir, "m.py", "def f():\n    \"\"\"Doc — with unicode.\"\"\"\n");

        let result = scan(dir.path(), &ScanOptions::default()).unwrap();
        let path = dir.path().join("data/functions.json");
        write_records(&path, &result.records).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Doc — with unicode."));
        assert_eq!(read_records(&path).unwrap(), result.records);
    }

    #[test]
    fn test_glob_matching() {
        assert!(glob_match_simple("*.egg-info", "repoqa.egg-info"));
        assert!(glob_match_simple(".git", ".git"));
        assert!(!glob_match_simple("venv", "venvs"));
        assert!(!glob_match_simple("a*a", "a"));
    }
}
