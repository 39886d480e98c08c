//! Text generation collaborators
//!
//! This module handles:
//! - The generation capability the dataset assembler calls
//! - Prompt construction for each unit
//! - A concrete HTTP client for Ollama / OpenAI-compatible servers

mod client;
mod prompts;

pub use client::{LlmClient, LlmConfig, LlmResponse, MockLlmClient};
pub use prompts::{question_for, DefaultPrompts};

use crate::dataset::Unit;
use anyhow::Result;

/// Something that turns a prompt into generated text.
///
/// Calls are synchronous and may be repeated for the same prompt.
pub trait Generator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

impl<F> Generator for F
where
    F: Fn(&str) -> Result<String>,
{
    fn generate(&self, prompt: &str) -> Result<String> {
        self(prompt)
    }
}

/// Builds the prompt for one unit given the repository digest
pub trait PromptBuilder {
    fn build(&self, unit: &Unit, digest: &str) -> String;
}

/// Remove the echoed prompt from generated text
pub fn strip_prompt(generated: &str, prompt: &str) -> String {
    if prompt.is_empty() {
        return generated.trim().to_string();
    }
    generated.replace(prompt, "").trim().to_string()
}
