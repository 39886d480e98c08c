//! Sequential dataset assembly with per-unit failure isolation

use super::{Sample, SampleSink, Unit};
use crate::llm::{strip_prompt, Generator, PromptBuilder};
use crate::structured::{extract_json_block, JsonObject};
use anyhow::Result;
use serde::Serialize;

/// Counts from one assembly run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of processing one unit
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Generated text held a usable object
    Generated(Sample),
    /// Every attempt failed; carries the fallback sample
    Fallback(Sample),
}

impl Outcome {
    pub fn sample(&self) -> &Sample {
        match self {
            Outcome::Generated(sample) | Outcome::Fallback(sample) => sample,
        }
    }

    pub fn into_sample(self) -> Sample {
        match self {
            Outcome::Generated(sample) | Outcome::Fallback(sample) => sample,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback(_))
    }
}

/// Turns units into samples, one output record per unit, in input order.
///
/// A failing unit becomes a fallback sample; only sink errors stop a run.
pub struct DatasetAssembler<'a> {
    generator: &'a dyn Generator,
    prompts: &'a dyn PromptBuilder,
    digest: &'a str,
    attempts: usize,
}

impl<'a> DatasetAssembler<'a> {
    /// Create an assembler that tries each unit once
    pub fn new(
        generator: &'a dyn Generator,
        prompts: &'a dyn PromptBuilder,
        digest: &'a str,
    ) -> Self {
        Self {
            generator,
            prompts,
            digest,
            attempts: 1,
        }
    }

    /// Set how many times generation + extraction is tried per unit
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Process every unit and write its sample before moving on
    pub fn assemble<S: SampleSink + ?Sized>(
        &self,
        units: &[Unit],
        sink: &mut S,
    ) -> Result<AssemblyReport> {
        let mut report = AssemblyReport {
            total: units.len(),
            ..Default::default()
        };

        for (index, unit) in units.iter().enumerate() {
            let outcome = self.process(unit);

            if outcome.is_fallback() {
                report.failed += 1;
            } else {
                report.succeeded += 1;
            }

            sink.write_sample(outcome.sample())?;
            tracing::info!("Processed {}/{}: {}", index + 1, units.len(), unit.label());
        }

        tracing::info!(
            "Assembled {} sample(s): {} succeeded, {} failed",
            report.total,
            report.succeeded,
            report.failed
        );

        Ok(report)
    }

    /// Produce the sample for one unit; never fails
    pub fn process(&self, unit: &Unit) -> Outcome {
        let prompt = self.prompts.build(unit, self.digest);
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match self.try_generate(&prompt) {
                Ok(parsed) => return Outcome::Generated(Sample::merge(unit, parsed)),
                Err(e) => {
                    tracing::warn!(
                        "Generation failed for {} (attempt {}/{}): {:#}",
                        unit.label(),
                        attempt,
                        self.attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        let message = last_error
            .map(|e| format!("{:#}", e))
            .unwrap_or_else(|| "no attempt made".to_string());

        Outcome::Fallback(Sample::fallback(unit, &message))
    }

    fn try_generate(&self, prompt: &str) -> Result<JsonObject> {
        let generated = self.generator.generate(prompt)?;
        let response = strip_prompt(&generated, prompt);
        tracing::debug!("Generated response:\n{}", response);

        Ok(extract_json_block(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::JsonlWriter;
    use crate::extract::FunctionRecord;
    use crate::llm::{DefaultPrompts, MockLlmClient};
    use serde_json::Value;
    use std::cell::Cell;

    fn units(count: usize) -> Vec<Unit> {
        (1..=count)
            .map(|i| {
                Unit::Function(FunctionRecord {
                    file: format!("pkg/mod_{}.py", i),
                    function: format!("unit_{}", i),
                    docstring: None,
                    code: format!("def unit_{}():\n    pass", i),
                    start_line: 1,
                    end_line: 2,
                })
            })
            .collect()
    }

    fn read_lines(output: Vec<u8>) -> Vec<Value> {
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_failed_unit_becomes_fallback_in_place() {
        let generator = |prompt: &str| -> Result<String> {
            if prompt.contains("def unit_3()") {
                anyhow::bail!("model crashed");
            }
            Ok(r#"Sure! {"answer": "Does a thing.", "trace": "Read it.",}"#.to_string())
        };

        let units = units(5);
        let assembler = DatasetAssembler::new(&generator, &DefaultPrompts, "digest");
        let mut writer = JsonlWriter::new(Vec::new());

        let report = assembler.assemble(&units, &mut writer).unwrap();

        assert_eq!(
            report,
            AssemblyReport {
                total: 5,
                succeeded: 4,
                failed: 1
            }
        );

        let lines = read_lines(writer.into_inner());
        assert_eq!(lines.len(), 5);

        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line["file"], format!("pkg/mod_{}.py", i + 1));
        }

        assert_eq!(lines[2]["function_name"], "unit_3");
        assert_eq!(lines[2]["question"], "What does the function unit_3 do?");
        assert_eq!(lines[2]["answer"], "[ERROR] model crashed");
        assert_eq!(lines[2]["trace"], "");

        for i in [0, 1, 3, 4] {
            assert_eq!(lines[i]["answer"], "Does a thing.");
        }
    }

    #[test]
    fn test_extraction_error_becomes_fallback() {
        let generator = |_: &str| -> Result<String> { Ok("I cannot help with that.".to_string()) };
        let units = Unit::requirements(["Add a health check endpoint."]);

        let mut samples: Vec<Sample> = Vec::new();
        DatasetAssembler::new(&generator, &DefaultPrompts, "")
            .assemble(&units, &mut samples)
            .unwrap();

        let value = serde_json::to_value(&samples[0]).unwrap();
        assert_eq!(value["requirement"], "Add a health check endpoint.");
        assert_eq!(value["design"], "[ERROR] no candidate block");
        assert_eq!(value["trace"], "");
    }

    #[test]
    fn test_echoed_prompt_is_stripped() {
        // The prompt itself contains JSON examples, so it must go first
        let generator = |prompt: &str| -> Result<String> {
            Ok(format!("{}\n{{\"design\": \"Add /health.\"}}", prompt))
        };
        let units = Unit::requirements(["Add a health check endpoint."]);

        let outcome = DatasetAssembler::new(&generator, &DefaultPrompts, "summary").process(&units[0]);

        let Outcome::Generated(Sample::Design(design)) = outcome else {
            panic!("expected a design sample");
        };
        assert_eq!(design.design.as_deref(), Some("Add /health."));
        assert_eq!(design.requirement, "Add a health check endpoint.");
    }

    #[test]
    fn test_bounded_attempts() {
        let calls = Cell::new(0);
        let generator = |_: &str| -> Result<String> {
            calls.set(calls.get() + 1);
            if calls.get() == 1 {
                Ok("garbage {".to_string())
            } else {
                Ok(r#"{"answer": "Second try."}"#.to_string())
            }
        };
        let units = units(1);

        let single = DatasetAssembler::new(&generator, &DefaultPrompts, "").process(&units[0]);
        assert!(single.is_fallback());

        calls.set(0);
        let retried = DatasetAssembler::new(&generator, &DefaultPrompts, "")
            .with_attempts(2)
            .process(&units[0]);

        assert!(!retried.is_fallback());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_marker_text_in_generated_answer_is_a_success() {
        let generator =
            |_: &str| -> Result<String> { Ok(r#"{"answer": "[ERROR] is the log prefix."}"#.to_string()) };
        let units = units(1);

        let mut samples: Vec<Sample> = Vec::new();
        let report = DatasetAssembler::new(&generator, &DefaultPrompts, "")
            .assemble(&units, &mut samples)
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, 0);
        let value = serde_json::to_value(&samples[0]).unwrap();
        assert_eq!(value["answer"], "[ERROR] is the log prefix.");
    }

    #[test]
    fn test_malformed_cause_appears_once() {
        let generator = |_: &str| -> Result<String> { Ok(r#"{"answer": }"#.to_string()) };
        let units = Unit::requirements(["Add a /ping route."]);

        let outcome = DatasetAssembler::new(&generator, &DefaultPrompts, "").process(&units[0]);
        assert!(outcome.is_fallback());

        let value = serde_json::to_value(outcome.into_sample()).unwrap();
        let design = value["design"].as_str().unwrap();

        assert!(design.starts_with("[ERROR] malformed JSON after repair passes [none]: "));
        assert_eq!(design.matches("expected value").count(), 1);
    }

    #[test]
    fn test_mock_client_as_generator() {
        let mut client = MockLlmClient::new();
        client.add_response("def unit_2()", r#"{"answer": "Second."}"#);

        let mut samples: Vec<Sample> = Vec::new();
        DatasetAssembler::new(&client, &DefaultPrompts, "")
            .assemble(&units(2), &mut samples)
            .unwrap();

        let answers: Vec<Value> = samples
            .iter()
            .map(|s| serde_json::to_value(s).unwrap()["answer"].clone())
            .collect();
        assert_eq!(answers, ["Mock answer", "Second."]);
    }
}
