//! Function extraction using tree-sitter
//!
//! Extracts every Python function definition from a source file:
//! - Top-level functions
//! - Nested functions and class methods
//! - Decorated and `async` definitions
//! - Docstrings

use super::ScanParseError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tree_sitter::Node;

/// Placeholder used in summary lines for functions without a docstring
pub const NO_DOCSTRING: &str = "(no docstring)";

/// One extracted function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Path of the source file as visited during the scan
    pub file: String,
    /// Declared function name (not qualified)
    pub function: String,
    /// Cleaned docstring, if the body starts with one
    pub docstring: Option<String>,
    /// Source text from the `def` line through the last line of the body
    pub code: String,
    /// 1-based line of the `def` keyword
    #[serde(default)]
    pub start_line: usize,
    /// 1-based, inclusive last line of the span
    #[serde(default)]
    pub end_line: usize,
}

impl FunctionRecord {
    /// One-line summary used in the repository digest
    pub fn summary_line(&self) -> String {
        let first_line = self
            .docstring
            .as_deref()
            .and_then(|doc| doc.trim().lines().next())
            .filter(|line| !line.is_empty())
            .unwrap_or(NO_DOCSTRING);

        format!("- {}: {}", self.function, first_line.trim())
    }
}

/// Extracts function records from Python source
pub struct FunctionExtractor {
    parser: tree_sitter::Parser,
}

impl FunctionExtractor {
    /// Create a new extractor
    pub fn new() -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .context("Failed to set Python language")?;

        Ok(Self { parser })
    }

    /// Extract all functions from one file's source text.
    ///
    /// A tree with syntax errors is rejected as a whole.
    pub fn extract_source(
        &mut self,
        path: &Path,
        source: &str,
    ) -> std::result::Result<Vec<FunctionRecord>, ScanParseError> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ScanParseError::new(path, 0, 0, "parser returned no tree"))?;

        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = first_error(root)
                .map(|n| (n.start_position().row + 1, n.start_position().column + 1))
                .unwrap_or((0, 0));
            return Err(ScanParseError::new(path, line, column, "invalid syntax"));
        }

        let lines: Vec<&str> = source.lines().collect();
        let file_path = path.to_string_lossy().to_string();

        let mut records = Vec::new();
        walk_tree(root, source, &lines, &file_path, &mut records);

        Ok(records)
    }
}

/// Pre-order walk so records come out in source order
fn walk_tree(
    node: Node,
    source: &str,
    lines: &[&str],
    file_path: &str,
    records: &mut Vec<FunctionRecord>,
) {
    if node.kind() == "function_definition" {
        if let Some(record) = extract_function(node, source, lines, file_path) {
            records.push(record);
        }
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_tree(child, source, lines, file_path, records);
    }
}

fn extract_function(
    node: Node,
    source: &str,
    lines: &[&str],
    file_path: &str,
) -> Option<FunctionRecord> {
    let name_node = node.child_by_field_name("name")?;
    let name = name_node.utf8_text(source.as_bytes()).ok()?;

    let start = node.start_position().row;
    let end = end_row(node).min(lines.len().saturating_sub(1));
    let code = lines.get(start..=end)?.join("\n");

    Some(FunctionRecord {
        file: file_path.to_string(),
        function: name.to_string(),
        docstring: extract_docstring(node, source),
        code,
        start_line: start + 1,
        end_line: end + 1,
    })
}

/// Last row (0-based) covered by a function definition.
///
/// Falls back to the start of the last body statement when the node's end
/// position is unusable; that approximation drops trailing comments.
fn end_row(node: Node) -> usize {
    let start = node.start_position().row;
    let end = node.end_position();

    let row = if end.column == 0 && end.row > start {
        end.row - 1
    } else {
        end.row
    };

    if row >= start {
        return row;
    }

    node.child_by_field_name("body")
        .and_then(|body| {
            let count = body.named_child_count();
            body.named_child(count.checked_sub(1)?)
        })
        .map(|last| last.start_position().row)
        .unwrap_or(start)
}

/// Find the first ERROR or MISSING node for diagnostics
fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Extract the docstring of a function definition
fn extract_docstring(node: Node, source: &str) -> Option<String> {
    let body = node.child_by_field_name("body")?;

    // Comments are named children of the block but are not statements
    let mut cursor = body.walk();
    let first_stmt = body
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")?;

    if first_stmt.kind() != "expression_statement" || first_stmt.named_child_count() != 1 {
        return None;
    }

    let expr = first_stmt.named_child(0)?;
    if expr.kind() != "string" {
        return None;
    }

    let raw = expr.utf8_text(source.as_bytes()).ok()?;
    parse_string_literal(raw).map(clean_docstring)
}

/// Strip prefix and quotes from a Python string literal.
///
/// Byte strings and f-strings are not docstrings.
fn parse_string_literal(raw: &str) -> Option<&str> {
    let quote_at = raw.find(['"', '\''])?;
    let prefix = raw[..quote_at].to_ascii_lowercase();
    if prefix.contains('b') || prefix.contains('f') {
        return None;
    }

    let literal = &raw[quote_at..];
    for quotes in ["\"\"\"", "'''", "\"", "'"] {
        if literal.len() >= 2 * quotes.len()
            && literal.starts_with(quotes)
            && literal.ends_with(quotes)
        {
            return Some(&literal[quotes.len()..literal.len() - quotes.len()]);
        }
    }

    None
}

/// Clean a docstring the way Python's `inspect.cleandoc` does
fn clean_docstring(content: &str) -> String {
    let expanded = content.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();

    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };

    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    let mut cleaned = vec![first.trim().to_string()];
    for line in rest {
        if line.trim().is_empty() {
            cleaned.push(String::new());
        } else {
            // every non-blank line has at least `indent` leading spaces
            cleaned.push(line[indent..].trim_end().to_string());
        }
    }

    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}
