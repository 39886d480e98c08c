//! Structured output extraction
//!
//! Recovers a single JSON object from free-form generated text. The text may
//! carry commentary before or after the object, and the object itself may
//! have the defects small models commonly produce. See [`repair`] for what is
//! fixed and how.

pub mod repair;

pub use repair::{RepairPass, Repaired};

use serde_json::{Map, Value};
use thiserror::Error;

/// A parsed JSON object
pub type JsonObject = Map<String, Value>;

/// Failure to recover a structured object from generated text
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("no candidate block")]
    NoCandidate,

    #[error("malformed JSON after repair passes [{}]", pass_list(.passes))]
    Malformed {
        /// Repair passes that changed the text
        passes: Vec<RepairPass>,
        /// The brace-delimited block before any repair
        candidate: String,
        /// The text that was handed to the parser
        repaired: String,
        #[source]
        source: serde_json::Error,
    },
}

fn pass_list(passes: &[RepairPass]) -> String {
    if passes.is_empty() {
        return "none".to_string();
    }
    passes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extract the maximal `{ ... }` block from text and parse it.
pub fn extract_json_block(text: &str) -> Result<JsonObject, ExtractionError> {
    extract_with(text, Vec::new())
}

/// Like [`extract_json_block`], for raw bytes that may not be valid UTF-8.
pub fn extract_json_block_bytes(bytes: &[u8]) -> Result<JsonObject, ExtractionError> {
    let (text, dropped) = repair::sanitize_bytes(bytes);
    let passes = if dropped {
        vec![RepairPass::SanitizeBytes]
    } else {
        Vec::new()
    };

    extract_with(&text, passes)
}

fn extract_with(text: &str, byte_passes: Vec<RepairPass>) -> Result<JsonObject, ExtractionError> {
    let candidate = candidate_block(text).ok_or(ExtractionError::NoCandidate)?;

    let repaired = repair::repair(candidate);
    if !repaired.applied.is_empty() {
        tracing::debug!("Applied repair passes: {}", pass_list(&repaired.applied));
    }

    let mut passes = repaired.applied;
    passes.extend(byte_passes);

    serde_json::from_str(&repaired.text).map_err(|source| ExtractionError::Malformed {
        passes,
        candidate: candidate.to_string(),
        repaired: repaired.text,
        source,
    })
}

/// First `{` through last `}`, greedy
fn candidate_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_noise_and_trailing_comma() {
        let parsed = extract_json_block("noise {\"a\": 1, \"b\": 2,} trailing").unwrap();

        assert_eq!(Value::Object(parsed), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_no_brace_is_an_error() {
        let err = extract_json_block("the model refused to answer").unwrap_err();

        assert!(matches!(err, ExtractionError::NoCandidate));
        assert_eq!(err.to_string(), "no candidate block");
        assert!(matches!(
            extract_json_block("} backwards {"),
            Err(ExtractionError::NoCandidate)
        ));
    }

    #[test]
    fn test_round_trip_of_serialized_object() {
        let original = json!({
            "function_name": "create_app",
            "question": "What does the function create_app do?",
            "answer": "Builds the \"app\", then returns it: {done}.",
            "trace": ["step one", "step two"],
            "nested": {"list": [1, 2.5, null, true], "empty": {}},
        });

        for text in [
            serde_json::to_string(&original).unwrap(),
            serde_json::to_string_pretty(&original).unwrap(),
        ] {
            let parsed = extract_json_block(&text).unwrap();
            assert_eq!(Value::Object(parsed), original);
        }
    }

    #[test]
    fn test_model_output_with_commentary() {
        let text = r#"<think>Let me analyze.</think>
Here is the result:
```json
{
  "function_name": "add",
  "question": "What does the function add do?",
  "answer": "Returns the "sum" of a and b.",
  "trace": "Reads the signature,
then the return statement.",
}
```
Hope this helps!"#;

        let parsed = extract_json_block(text).unwrap();

        assert_eq!(parsed["answer"], "Returns the \"sum\" of a and b.");
        assert_eq!(parsed["trace"], "Reads the signature,\nthen the return statement.");
    }

    #[test]
    fn test_invalid_bytes_are_dropped() {
        let parsed = extract_json_block_bytes(b"\xfe{\"a\": \"caf\xc3\xa9\xff\"}").unwrap();

        assert_eq!(parsed["a"], "café");
    }

    #[test]
    fn test_unrecoverable_block_reports_diagnostics() {
        let err = extract_json_block("{\"a\": 1,, \"b\": [1,]}").unwrap_err();

        match err {
            ExtractionError::Malformed {
                passes,
                candidate,
                repaired,
                ..
            } => {
                assert_eq!(passes, [RepairPass::TrailingCommas]);
                assert_eq!(candidate, "{\"a\": 1,, \"b\": [1,]}");
                assert_eq!(repaired, "{\"a\": 1,, \"b\": [1]}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_message_names_passes() {
        let err = extract_json_block_bytes(b"{\xff\"a\": }").unwrap_err();
        let message = err.to_string();

        assert_eq!(message, "malformed JSON after repair passes [sanitize-bytes]");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_non_object_block_is_rejected() {
        assert!(extract_json_block("{1: 2}").is_err());
    }
}
