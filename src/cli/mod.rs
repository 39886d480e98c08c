//! CLI interface using clap
//!
//! Provides the command-line interface for repoqa

mod commands;

pub use commands::*;

use crate::config::CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// repoqa - build code Q&A datasets from a repository
#[derive(Parser, Debug)]
#[command(name = "repoqa")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (optional; defaults are used when it is missing)
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    pub config: PathBuf,

    /// Project directory to scan (overrides the config file)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Directory for artifacts and datasets (overrides the config file)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan the project and write the function records and digest
    Extract(ExtractArgs),

    /// Print the repository digest without writing files
    Digest(DigestArgs),

    /// Generate a dataset with the configured LLM
    Generate(GenerateArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Generation task
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Task {
    /// Function question/answer pairs
    Qa,
    /// Requirement design pairs
    Re,
}

/// Arguments for extract command
#[derive(Parser, Debug)]
pub struct ExtractArgs {
    /// README to include in the digest
    #[arg(short, long)]
    pub readme: Option<PathBuf>,
}

/// Arguments for digest command
#[derive(Parser, Debug)]
pub struct DigestArgs {
    /// README to include in the digest
    #[arg(short, long)]
    pub readme: Option<PathBuf>,
}

/// Arguments for generate command
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Which dataset to generate
    #[arg(short, long, value_enum)]
    pub task: Task,

    /// Reuse existing artifacts instead of scanning first
    #[arg(long)]
    pub skip_extract: bool,

    /// Attempts per unit before writing a fallback sample
    #[arg(short, long)]
    pub attempts: Option<usize>,

    /// LLM endpoint (overrides the config file)
    #[arg(long, env = "REPOQA_LLM_ENDPOINT")]
    pub endpoint: Option<String>,

    /// LLM model (overrides the config file)
    #[arg(short, long, env = "REPOQA_LLM_MODEL")]
    pub model: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
