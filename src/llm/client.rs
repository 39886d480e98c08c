//! LLM client for API communication

use super::Generator;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Response from LLM
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// The generated content
    pub content: String,
    /// Number of tokens used
    pub tokens_used: Option<usize>,
}

/// Configuration for LLM client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model name
    #[serde(default = "default_model")]
    pub model: String,
    /// API key (optional)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    /// Temperature for generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Attempts per request before giving up on transport errors
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "deepseek-r1:1.5b".to_string()
}

fn default_max_tokens() -> usize {
    512
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_retries() -> usize {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_retries: default_max_retries(),
        }
    }
}

impl LlmConfig {
    fn is_ollama(&self) -> bool {
        self.endpoint.contains("11434")
    }
}

/// LLM client used as the generation capability.
///
/// Requests are async under the hood; a private current-thread runtime turns
/// every [`Generator::generate`] call into one blocking request.
pub struct LlmClient {
    config: LlmConfig,
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl LlmClient {
    /// Create a new LLM client
    pub fn new(config: LlmConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start async runtime for LLM client")?;

        Ok(Self {
            config,
            client: reqwest::Client::new(),
            runtime,
        })
    }

    /// Get the client configuration
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    /// Check if the LLM service is available
    pub fn is_available(&self) -> bool {
        let url = if self.config.is_ollama() {
            format!("{}/api/tags", self.config.endpoint)
        } else {
            format!("{}/v1/models", self.config.endpoint)
        };

        self.runtime
            .block_on(self.client.get(&url).send())
            .is_ok()
    }

    /// Generate a completion
    pub async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        if self.config.is_ollama() {
            self.complete_ollama(prompt).await
        } else {
            self.complete_openai(prompt).await
        }
    }

    /// Generate completion using Ollama API
    async fn complete_ollama(&self, prompt: &str) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", self.config.endpoint);

        let request = OllamaGenerateRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
                num_predict: self.config.max_tokens as i32,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama request failed: {} - {}", status, body);
        }

        let result: OllamaGenerateResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(LlmResponse {
            content: result.response,
            tokens_used: Some(result.eval_count.unwrap_or(0) as usize),
        })
    }

    /// Generate completion using OpenAI-compatible API
    async fn complete_openai(&self, prompt: &str) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.config.endpoint);

        let request = OpenAIChatRequest {
            model: self.config.model.clone(),
            messages: vec![OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
        };

        let mut req_builder = self.client.post(&url).json(&request);

        if let Some(ref key) = self.config.api_key {
            req_builder = req_builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = req_builder
            .send()
            .await
            .context("Failed to send request to OpenAI-compatible API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI request failed: {} - {}", status, body);
        }

        let result: OpenAIChatResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI response")?;

        let content = result
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        let tokens_used = result.usage.map(|u| u.total_tokens as usize);

        Ok(LlmResponse {
            content,
            tokens_used,
        })
    }

    /// Generate completion with retry
    pub async fn complete_with_retry(
        &self,
        prompt: &str,
        max_retries: usize,
    ) -> Result<LlmResponse> {
        let mut last_error = None;

        let attempts = max_retries.max(1);

        for attempt in 0..attempts {
            match self.complete(prompt).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!("LLM request failed (attempt {}): {}", attempt + 1, e);
                    last_error = Some(e);

                    // Wait before retry
                    if attempt + 1 < attempts {
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1)))
                            .await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Unknown error")))
    }
}

impl Generator for LlmClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .runtime
            .block_on(self.complete_with_retry(prompt, self.config.max_retries))?;

        if let Some(tokens) = response.tokens_used {
            tracing::debug!("LLM used {} tokens", tokens);
        }

        Ok(response.content)
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: i32,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    eval_count: Option<i32>,
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAIChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIChatResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    total_tokens: i32,
}

/// Mock LLM client for testing
pub struct MockLlmClient {
    responses: HashMap<String, String>,
    default_response: String,
}

impl MockLlmClient {
    /// Create a new mock client
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            default_response: r#"{"answer": "Mock answer", "design": "Mock design", "trace": "Mock trace"}"#
                .to_string(),
        }
    }

    /// Add a mock response
    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .insert(prompt_contains.to_string(), response.to_string());
    }

    /// Generate a mock completion
    pub fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        for (key, response) in &self.responses {
            if prompt.contains(key) {
                return Ok(LlmResponse {
                    content: response.clone(),
                    tokens_used: Some(100),
                });
            }
        }

        Ok(LlmResponse {
            content: self.default_response.clone(),
            tokens_used: Some(50),
        })
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for MockLlmClient {
    fn generate(&self, prompt: &str) -> Result<String> {
        Ok(self.complete(prompt)?.content)
    }
}
