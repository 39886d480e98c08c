//! Best-effort repairs for almost-JSON produced by text generation.
//!
//! Every pass is a heuristic. The quote pass decides where a string ends by
//! looking at the next non-whitespace character, so a value such as
//! `"a "quoted", word"` is still split at the wrong place and will fail to
//! parse afterwards. Callers must treat a failed parse after repair as a
//! normal outcome.

use std::fmt;

/// One repair pass, in the order they are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepairPass {
    /// Escape unescaped quotes and raw control characters inside strings
    EscapeQuotes,
    /// Drop commas directly before `}` or `]`
    TrailingCommas,
    /// Drop bytes that are not valid UTF-8
    SanitizeBytes,
}

impl fmt::Display for RepairPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairPass::EscapeQuotes => write!(f, "escape-quotes"),
            RepairPass::TrailingCommas => write!(f, "trailing-commas"),
            RepairPass::SanitizeBytes => write!(f, "sanitize-bytes"),
        }
    }
}

/// Text after the repair passes, with the passes that changed it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repaired {
    pub text: String,
    pub applied: Vec<RepairPass>,
}

/// Run the text passes over a candidate block
pub fn repair(candidate: &str) -> Repaired {
    let mut applied = Vec::new();

    let escaped = escape_inner_quotes(candidate);
    if escaped != candidate {
        applied.push(RepairPass::EscapeQuotes);
    }

    let text = remove_trailing_commas(&escaped);
    if text != escaped {
        applied.push(RepairPass::TrailingCommas);
    }

    Repaired { text, applied }
}

/// Escape quotes that cannot be closing a string.
///
/// A `"` inside a string closes it only when the next non-whitespace
/// character is `,`, `}`, `]`, `:` or the end of the text.
pub fn escape_inner_quotes(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if !in_string {
            in_string = c == '"';
            out.push(c);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }

        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' if closes_string(&chars[i + 1..]) => {
                in_string = false;
                out.push(c);
            }
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }

    out
}

fn closes_string(rest: &[char]) -> bool {
    match rest.iter().find(|c| !c.is_whitespace()) {
        None => true,
        Some(c) => matches!(c, ',' | '}' | ']' | ':'),
    }
}

/// Remove commas that directly precede a closing `}` or `]`.
///
/// Commas inside string literals are left alone.
pub fn remove_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            out.push(c);
            continue;
        }

        match c {
            '"' => in_string = true,
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if matches!(next, Some('}') | Some(']')) {
                    continue;
                }
            }
            _ => {}
        }
        out.push(c);
    }

    out
}

/// Decode bytes as UTF-8, dropping invalid sequences instead of replacing them.
///
/// Returns the text and whether anything was dropped.
pub fn sanitize_bytes(bytes: &[u8]) -> (String, bool) {
    let mut text = String::with_capacity(bytes.len());
    let mut dropped = false;

    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        dropped |= !chunk.invalid().is_empty();
    }

    (text, dropped)
}
