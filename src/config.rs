//! Configuration for repoqa

use crate::extract::ScanOptions;
use crate::llm::LlmConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE: &str = "repoqa.toml";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory to scan
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,

    /// README to include in the digest (defaults to `<project_dir>/README.md`)
    #[serde(default)]
    pub readme: Option<PathBuf>,

    /// Directory for intermediate artifacts and datasets
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory or file names never visited by the scanner
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Requirements used by the design-generation task
    #[serde(default = "default_requirements")]
    pub requirements: Vec<String>,

    /// Per-unit generation behavior
    #[serde(default)]
    pub generation: GenerationConfig,

    /// LLM endpoint configuration
    #[serde(default)]
    pub llm: LlmConfig,
}

/// Per-unit generation behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Times generation + extraction is tried before a fallback sample
    #[serde(default = "default_attempts")]
    pub attempts: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
        }
    }
}

fn default_project_dir() -> PathBuf {
    PathBuf::from("example")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_ignore_patterns() -> Vec<String> {
    ScanOptions::default().ignore_patterns
}

fn default_requirements() -> Vec<String> {
    vec![
        "Add a new API endpoint that computes the average of two numbers submitted by the user."
            .to_string(),
        "Implement a health check endpoint that returns the application's status.".to_string(),
        "Register logging for every blueprint, recording the request path and time.".to_string(),
        "Add a configuration option that controls whether returned JSON is pretty-printed."
            .to_string(),
        "Provide an endpoint that serves mock data for frontend integration.".to_string(),
    ]
}

fn default_attempts() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            readme: None,
            data_dir: default_data_dir(),
            ignore_patterns: default_ignore_patterns(),
            requirements: default_requirements(),
            generation: GenerationConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file or return defaults when it is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?;
            Ok(config)
        } else {
            tracing::debug!("No config file at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Scanner options derived from this configuration
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            ignore_patterns: self.ignore_patterns.clone(),
        }
    }

    pub fn readme_path(&self) -> PathBuf {
        self.readme
            .clone()
            .unwrap_or_else(|| self.project_dir.join("README.md"))
    }

    pub fn functions_path(&self) -> PathBuf {
        self.data_dir.join("functions.json")
    }

    pub fn digest_path(&self) -> PathBuf {
        self.data_dir.join("repo_summary.txt")
    }

    pub fn qa_output_path(&self) -> PathBuf {
        self.data_dir.join("qa.jsonl")
    }

    pub fn requirements_output_path(&self) -> PathBuf {
        self.data_dir.join("requirement.jsonl")
    }
}
