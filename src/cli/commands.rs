//! Command implementations

use super::Task;
use crate::config::Config;
use crate::dataset::{AssemblyReport, DatasetAssembler, JsonlWriter, Unit};
use crate::digest::{build_digest, read_readme, write_digest};
use crate::extract::{read_records, scan, write_records};
use crate::llm::{DefaultPrompts, LlmClient};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;

/// What an extraction run produced
#[derive(Debug, Clone, Serialize)]
pub struct ExtractSummary {
    /// Number of function records written
    pub functions: usize,
    /// Number of files that contributed at least one function
    pub files: usize,
    /// Files that could not be read or parsed
    pub skipped: Vec<String>,
    pub functions_path: PathBuf,
    pub digest_path: PathBuf,
}

/// Scan the project, then write the function records and the digest
pub fn extract(config: &Config) -> Result<ExtractSummary> {
    let result = scan(&config.project_dir, &config.scan_options())
        .with_context(|| format!("Failed to scan {:?}", config.project_dir))?;

    let functions_path = config.functions_path();
    write_records(&functions_path, &result.records)?;

    let readme = read_readme(&config.readme_path())?;
    let digest_path = config.digest_path();
    write_digest(&digest_path, &build_digest(&result.structure, &readme))?;

    Ok(ExtractSummary {
        functions: result.records.len(),
        files: result.structure.len(),
        skipped: result.skipped.iter().map(ToString::to_string).collect(),
        functions_path,
        digest_path,
    })
}

/// Render the digest for the project without writing anything
pub fn digest(config: &Config) -> Result<String> {
    let result = scan(&config.project_dir, &config.scan_options())
        .with_context(|| format!("Failed to scan {:?}", config.project_dir))?;
    let readme = read_readme(&config.readme_path())?;

    Ok(build_digest(&result.structure, &readme))
}

/// What a generation run produced
#[derive(Debug, Clone, Serialize)]
pub struct GenerateSummary {
    #[serde(flatten)]
    pub report: AssemblyReport,
    pub output_path: PathBuf,
}

/// Generate a dataset for the given task.
///
/// Progress goes to the log; stdout is left to the caller's printer.
pub fn generate(config: &Config, task: Task, skip_extract: bool) -> Result<GenerateSummary> {
    if !skip_extract {
        tracing::info!("Extracting repository information...");
        let summary = extract(config)?;
        tracing::info!(
            "Extracted {} function(s) from {} file(s), {} skipped",
            summary.functions,
            summary.files,
            summary.skipped.len()
        );
    }

    let digest_path = config.digest_path();
    let digest = std::fs::read_to_string(&digest_path)
        .with_context(|| format!("Failed to read digest: {:?}", digest_path))?;

    let (units, output_path) = match task {
        Task::Qa => {
            tracing::info!("Generating QA dataset...");
            let records = read_records(&config.functions_path())?;
            (Unit::functions(records), config.qa_output_path())
        }
        Task::Re => {
            tracing::info!("Generating requirement dataset...");
            (
                Unit::requirements(config.requirements.clone()),
                config.requirements_output_path(),
            )
        }
    };

    let client = LlmClient::new(config.llm.clone())?;
    if !client.is_available() {
        tracing::warn!(
            "LLM endpoint {} is not reachable; samples will carry errors",
            client.config().endpoint
        );
    }

    let mut writer = JsonlWriter::create(&output_path)?;
    let report = DatasetAssembler::new(&client, &DefaultPrompts, digest.trim())
        .with_attempts(config.generation.attempts)
        .assemble(&units, &mut writer)?;

    Ok(GenerateSummary {
        report,
        output_path,
    })
}

/// Print an extraction summary as text
pub fn print_extract_text(summary: &ExtractSummary) {
    println!(
        "✓ Extracted {} function(s) from {} file(s)",
        summary.functions, summary.files
    );
    println!("  Records: {:?}", summary.functions_path);
    println!("  Digest: {:?}", summary.digest_path);

    if !summary.skipped.is_empty() {
        println!("\n⚠ Skipped {} file(s):", summary.skipped.len());
        for skipped in &summary.skipped {
            println!("  - {}", skipped);
        }
    }
}

/// Print a generation summary as text
pub fn print_generate_text(summary: &GenerateSummary) {
    println!(
        "✓ Wrote {} sample(s) to {:?} ({} failed)",
        summary.report.total, summary.output_path, summary.report.failed
    );
}

/// Print a generation summary as JSON
pub fn print_generate_json(summary: &GenerateSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    println!("{}", json);
    Ok(())
}

/// Print an extraction summary as JSON
pub fn print_extract_json(summary: &ExtractSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> Config {
        let project = dir.path().join("project");
        fs::create_dir_all(project.join("app")).unwrap();
        fs::write(
            project.join("app/routes.py"),
            "def index():\n    \"\"\"Serve the index page.\"\"\"\n    return 'ok'\n",
        )
        .unwrap();
        fs::write(project.join("app/broken.py"), "def (\n").unwrap();
        fs::write(project.join("README.md"), "# Demo\n").unwrap();

        Config {
            project_dir: project,
            data_dir: dir.path().join("data"),
            ..Config::default()
        }
    }

    #[test]
    fn test_extract_writes_artifacts() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);

        let summary = extract(&config).unwrap();

        assert_eq!(summary.functions, 1);
        assert_eq!(summary.files, 1);
        assert_eq!(summary.skipped.len(), 1);

        let digest = fs::read_to_string(config.digest_path()).unwrap();
        assert!(digest.contains("# Demo"));
        assert!(digest.contains("## app/routes.py\n- index: Serve the index page."));

        let records = read_records(&config.functions_path()).unwrap();
        assert_eq!(records[0].function, "index");
    }

    #[test]
    fn test_digest_matches_written_file() {
        let dir = TempDir::new().unwrap();
        let config = config_for(&dir);

        extract(&config).unwrap();

        assert_eq!(
            digest(&config).unwrap(),
            fs::read_to_string(config.digest_path()).unwrap()
        );
    }

    #[test]
    fn test_extract_missing_project_fails() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            project_dir: dir.path().join("absent"),
            data_dir: dir.path().join("data"),
            ..Config::default()
        };

        assert!(extract(&config).is_err());
        assert!(!config.functions_path().exists());
    }
}
