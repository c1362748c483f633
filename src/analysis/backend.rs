//! Text-completion backends
//!
//! The analyzer only needs "prompt in, text out". [`OllamaBackend`] talks to a
//! local Ollama server over its `/api/generate` endpoint; tests substitute
//! their own [`CompletionBackend`].

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::AnalysisConfig;

/// One completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[allow(async_fn_in_trait)]
pub trait CompletionBackend {
    /// Run one completion and return the generated text
    async fn generate(&self, request: &CompletionRequest) -> Result<String>;
}

/// Completion backend for a local Ollama server
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: Client,
    generate_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorBody {
    error: String,
}

impl OllamaBackend {
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        info!(
            "Initializing Ollama backend: endpoint={}, model={}",
            config.endpoint, config.model
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build analysis HTTP client")?;

        Ok(Self {
            client,
            generate_url: format!("{}/api/generate", config.endpoint.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }
}

impl CompletionBackend for OllamaBackend {
    async fn generate(&self, request: &CompletionRequest) -> Result<String> {
        let body = GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!(
            "Sending completion request to {} ({} prompt chars)",
            self.generate_url,
            request.prompt.chars().count()
        );

        let response = self
            .client
            .post(&self.generate_url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Completion request to {} failed", self.generate_url))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OllamaErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or(text);
            anyhow::bail!("Ollama returned {status}: {message}");
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;
        Ok(parsed.response.trim().to_string())
    }
}
