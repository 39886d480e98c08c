//! Generation units and the samples produced from them

use crate::extract::FunctionRecord;
use crate::llm::question_for;
use crate::structured::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Prefix marking a sample whose generation failed
pub const ERROR_MARKER: &str = "[ERROR]";

/// One item submitted for generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unit {
    /// Function-level question/answer generation
    Function(FunctionRecord),
    /// Design generation for a free-text requirement
    Requirement(String),
}

impl Unit {
    /// Wrap function records as units
    pub fn functions(records: Vec<FunctionRecord>) -> Vec<Unit> {
        records.into_iter().map(Unit::Function).collect()
    }

    /// Wrap requirement texts as units
    pub fn requirements<I, S>(requirements: I) -> Vec<Unit>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        requirements
            .into_iter()
            .map(|r| Unit::Requirement(r.into()))
            .collect()
    }

    /// Short human-readable label for logs
    pub fn label(&self) -> &str {
        match self {
            Unit::Function(record) => &record.function,
            Unit::Requirement(requirement) => requirement,
        }
    }
}

/// A function question/answer sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaSample {
    pub file: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    /// Parsed keys without a named field
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A requirement/design sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignSample {
    pub requirement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    /// Parsed keys without a named field
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One output record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Sample {
    Qa(QaSample),
    Design(DesignSample),
}

impl Sample {
    /// Merge a parsed object into the unit's identifying fields.
    ///
    /// Parsed values win over the unit's own fields; a JSON `null` counts as
    /// absent for identifying fields.
    pub fn merge(unit: &Unit, parsed: JsonObject) -> Self {
        match unit {
            Unit::Function(record) => {
                let mut sample = QaSample {
                    file: record.file.clone(),
                    code: record.code.clone(),
                    function_name: None,
                    question: None,
                    answer: None,
                    trace: None,
                    extra: BTreeMap::new(),
                };

                for (key, value) in parsed {
                    match key.as_str() {
                        "file" => set_text(&mut sample.file, value),
                        "code" => set_text(&mut sample.code, value),
                        "function_name" => sample.function_name = value_text(value),
                        "question" => sample.question = value_text(value),
                        "answer" => sample.answer = value_text(value),
                        "trace" => sample.trace = value_text(value),
                        _ => {
                            sample.extra.insert(key, value);
                        }
                    }
                }

                Sample::Qa(sample)
            }
            Unit::Requirement(requirement) => {
                let mut sample = DesignSample {
                    requirement: requirement.clone(),
                    design: None,
                    trace: None,
                    extra: BTreeMap::new(),
                };

                for (key, value) in parsed {
                    match key.as_str() {
                        "requirement" => set_text(&mut sample.requirement, value),
                        "design" => sample.design = value_text(value),
                        "trace" => sample.trace = value_text(value),
                        _ => {
                            sample.extra.insert(key, value);
                        }
                    }
                }

                Sample::Design(sample)
            }
        }
    }

    /// Sample substituted when generation or extraction failed.
    ///
    /// Keeps the unit's question/requirement text unchanged.
    pub fn fallback(unit: &Unit, message: &str) -> Self {
        let error = format!("{} {}", ERROR_MARKER, message);

        match unit {
            Unit::Function(record) => Sample::Qa(QaSample {
                file: record.file.clone(),
                code: record.code.clone(),
                function_name: Some(record.function.clone()),
                question: Some(question_for(&record.function)),
                answer: Some(error),
                trace: Some(String::new()),
                extra: BTreeMap::new(),
            }),
            Unit::Requirement(requirement) => Sample::Design(DesignSample {
                requirement: requirement.clone(),
                design: Some(error),
                trace: Some(String::new()),
                extra: BTreeMap::new(),
            }),
        }
    }
}

fn set_text(field: &mut String, value: Value) {
    if let Some(text) = value_text(value) {
        *field = text;
    }
}

/// Render a parsed value as text
fn value_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) if items.iter().all(Value::is_string) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> FunctionRecord {
        FunctionRecord {
            file: "example/app.py".to_string(),
            function: "create_app".to_string(),
            docstring: Some("Build the app.".to_string()),
            code: "def create_app():\n    pass".to_string(),
            start_line: 1,
            end_line: 2,
        }
    }

    fn object(value: Value) -> JsonObject {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parsed_fields_win() {
        let parsed = object(json!({
            "function_name": "create_app",
            "answer": "Creates the Flask app.",
            "trace": ["Reads config.", "Registers blueprints."],
            "file": "renamed.py",
            "confidence": 0.9,
        }));

        let sample = Sample::merge(&Unit::Function(record()), parsed);
        let Sample::Qa(qa) = &sample else {
            panic!("expected a QA sample");
        };

        assert_eq!(qa.file, "renamed.py");
        assert_eq!(qa.code, "def create_app():\n    pass");
        assert_eq!(qa.trace.as_deref(), Some("Reads config.\nRegisters blueprints."));
        assert_eq!(qa.question, None);
        assert_eq!(qa.extra["confidence"], json!(0.9));
    }

    #[test]
    fn test_serialized_sample_is_flat() {
        let parsed = object(json!({"answer": "x", "note": "kept"}));
        let sample = Sample::merge(&Unit::Function(record()), parsed);

        let value = serde_json::to_value(&sample).unwrap();

        assert_eq!(
            value,
            json!({
                "file": "example/app.py",
                "code": "def create_app():\n    pass",
                "answer": "x",
                "note": "kept",
            })
        );
    }

    #[test]
    fn test_null_does_not_erase_identity() {
        let parsed = object(json!({"requirement": null, "design": "Add a route."}));
        let unit = Unit::Requirement("Add a health check.".to_string());

        let Sample::Design(design) = Sample::merge(&unit, parsed) else {
            panic!("expected a design sample");
        };

        assert_eq!(design.requirement, "Add a health check.");
        assert_eq!(design.design.as_deref(), Some("Add a route."));
    }

    #[test]
    fn test_fallback_keeps_question_and_requirement() {
        let qa = Sample::fallback(&Unit::Function(record()), "no candidate block");
        let value = serde_json::to_value(&qa).unwrap();

        assert_eq!(value["function_name"], "create_app");
        assert_eq!(value["question"], "What does the function create_app do?");
        assert_eq!(value["answer"], "[ERROR] no candidate block");
        assert_eq!(value["trace"], "");

        let unit = Unit::Requirement("Add a mock data endpoint.".to_string());
        let design = serde_json::to_value(Sample::fallback(&unit, "timeout")).unwrap();

        assert_eq!(design["requirement"], "Add a mock data endpoint.");
        assert_eq!(design["design"], "[ERROR] timeout");
    }
}
