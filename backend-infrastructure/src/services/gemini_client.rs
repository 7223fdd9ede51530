use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use backend_domain::{GenerationConfig, ModelClient, ModelConfig};

/// Gemini `generateContent` client. Tries the primary model first and the
/// fallback model once if the primary call fails.
///
/// `attempt_timeout` bounds each model call separately; callers that wrap
/// `generate` in their own deadline should use [`GeminiModelClient::call_budget`].
pub struct GeminiModelClient {
    client: Client,
    config: ModelConfig,
    attempt_timeout: Duration,
}

impl GeminiModelClient {
    pub fn new(config: ModelConfig, attempt_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(attempt_timeout)
            .build()
            .context("failed to build Gemini HTTP client")?;
        Ok(Self {
            client,
            config,
            attempt_timeout,
        })
    }

    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Time needed for the primary attempt plus the fallback attempt, with
    /// one second of slack for the hand-over.
    pub fn call_budget(&self) -> Duration {
        let attempts = if self.config.fallback_model.is_some() { 2 } else { 1 };
        self.attempt_timeout * attempts + Duration::from_secs(1)
    }

    async fn generate_with(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        input: &str,
        generation: &GenerationConfig,
    ) -> Result<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, model
        );
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: prompt }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: input }],
            }],
            generation_config: GenerationSettings {
                temperature: generation.temperature,
                top_p: generation.top_p,
                top_k: generation.top_k,
                max_output_tokens: generation.max_output_tokens,
            },
        };

        let resp = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .with_context(|| format!("failed to call Gemini model {}", model))?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            bail!("Gemini {} returned {}: {}", model, status, text);
        }
        let parsed: GenerateResponse = resp
            .json()
            .await
            .context("failed to parse Gemini response")?;
        response_text(parsed).ok_or_else(|| anyhow!("Gemini {} response missing text content", model))
    }
}

#[async_trait]
impl ModelClient for GeminiModelClient {
    async fn generate(
        &self,
        prompt: &str,
        input: &str,
        config: &GenerationConfig,
    ) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("gemini_api_key is not configured"))?;

        match self
            .generate_with(api_key, &self.config.model, prompt, input, config)
            .await
        {
            Ok(text) => Ok(text),
            Err(err) => {
                let Some(fallback) = self.config.fallback_model.as_deref() else {
                    return Err(err);
                };
                warn!("primary model failed ({:#}), falling back to {}", err, fallback);
                let text = self
                    .generate_with(api_key, fallback, prompt, input, config)
                    .await?;
                info!("fallback model {} answered", fallback);
                Ok(text)
            }
        }
    }
}

fn response_text(response: GenerateResponse) -> Option<String> {
    let text = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<Vec<_>>()
        .join("");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationSettings,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationSettings {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
