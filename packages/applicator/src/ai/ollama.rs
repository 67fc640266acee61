//! Ollama-backed [`VisionModel`] implementation.
//!
//! Talks to a local Ollama daemon's `/api/generate` endpoint with a
//! base64-encoded screenshot attached. Non-streaming: one request, one
//! full response per prompt.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analyze::prompts::{CAPTCHA_PROMPT, CONFIRMATION_PROMPT, FORM_ANALYSIS_PROMPT};
use crate::analyze::vision::{
    parse_captcha_response, parse_confirmation_response, parse_form_response,
};
use crate::error::{ApplyError, Result};
use crate::traits::vision::{ConfirmationVerdict, VisionAnalysis, VisionModel};

/// Connection settings for the Ollama daemon.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL of the daemon. Default: `http://localhost:11434`.
    pub base_url: String,

    /// Multimodal model name. Default: `llava`.
    pub model: String,

    /// Per-request timeout. Vision inference on CPU is slow; default 120s.
    pub request_timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llava".to_string(),
            request_timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// [`VisionModel`] backed by a local Ollama daemon.
pub struct OllamaVision {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaVision {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ApplyError::vision)?;
        Ok(Self { client, config })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(OllamaConfig::default())
    }

    /// One prompt-plus-image round trip; returns the raw model text.
    async fn generate(&self, prompt: &str, image: &[u8]) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            images: vec![encoded],
            stream: false,
        };

        debug!(model = %self.config.model, image_bytes = image.len(), "ollama generate");

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&request)
            .send()
            .await
            .map_err(ApplyError::vision)?
            .error_for_status()
            .map_err(ApplyError::vision)?;

        let body: GenerateResponse = response.json().await.map_err(ApplyError::vision)?;
        Ok(body.response)
    }
}

#[async_trait]
impl VisionModel for OllamaVision {
    async fn analyze_form(&self, image: &[u8]) -> Result<VisionAnalysis> {
        let raw = self.generate(FORM_ANALYSIS_PROMPT, image).await?;
        parse_form_response(&raw)
    }

    async fn detect_captcha(&self, image: &[u8]) -> Result<bool> {
        let raw = self.generate(CAPTCHA_PROMPT, image).await?;
        Ok(parse_captcha_response(&raw))
    }

    async fn classify_confirmation(&self, image: &[u8]) -> Result<ConfirmationVerdict> {
        let raw = self.generate(CONFIRMATION_PROMPT, image).await?;
        Ok(parse_confirmation_response(&raw))
    }
}
