//! repoqa - build code Q&A datasets from a Python repository
//!
//! The library scans a project into function records and a digest of its
//! structure, prompts an LLM once per function or requirement, recovers a
//! JSON object from each (often noisy) response and writes one JSONL sample
//! per unit.

pub mod cli;
pub mod config;
pub mod dataset;
pub mod digest;
pub mod extract;
pub mod llm;
pub mod structured;

/// Re-export commonly used types
pub use config::Config;
pub use dataset::{DatasetAssembler, Sample, Unit};
pub use extract::{FunctionRecord, RepoStructure};
pub use structured::{extract_json_block, ExtractionError};

/// Application-wide error type
pub use anyhow::Result;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "repoqa";
