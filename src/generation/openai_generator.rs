use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use super::generation_interface::GenerationProvider;
use super::{endpoint, generation_failed, FETCH_FAILED, INVALID_RESPONSE};
use crate::error::{AppError, AppResult};

const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
}

/// OpenAI-compatible legacy completions endpoint.
/// The first choice's `text` is the result.
pub struct OpenAIGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl OpenAIGenerator {
    pub fn new(
        client: Client,
        base_url: String,
        api_key: Option<String>,
        model: Option<String>,
        max_tokens: u32,
    ) -> Self {
        let model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        info!("Initialized OpenAIGenerator: model={}, base_url={}", model, base_url);
        Self {
            client,
            base_url,
            api_key,
            model,
            max_tokens,
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAIGenerator {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            error!("Generation API key not configured");
            AppError::Configuration("Generation service not configured.".to_string())
        })?;

        let url = endpoint(&self.base_url, "v1/completions");
        debug!("Sending generation request: provider=openai, model={}", self.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&CompletionRequest {
                model: &self.model,
                prompt,
                max_tokens: self.max_tokens,
            })
            .send()
            .await
            .map_err(|e| {
                error!("OpenAI API request failed: {}", e);
                generation_failed(FETCH_FAILED)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("OpenAI API error: status={}, body={}", status, body);
            return Err(generation_failed(FETCH_FAILED));
        }

        let data: Value = response.json().await.map_err(|e| {
            error!("OpenAI API returned unreadable body: {}", e);
            generation_failed(FETCH_FAILED)
        })?;

        data.pointer("/choices/0/text")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                error!("OpenAI API returned no valid text: {}", data);
                generation_failed(INVALID_RESPONSE)
            })
    }

    fn name(&self) -> &str {
        "openai"
    }
}
