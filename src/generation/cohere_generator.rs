use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info};

use super::generation_interface::GenerationProvider;
use super::{endpoint, generation_failed, FETCH_FAILED, INVALID_RESPONSE};
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct CohereGenerateRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
}

/// Cohere `generate` endpoint: `{ prompt, max_tokens }` in, `{ text }` out.
pub struct CohereGenerator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    max_tokens: u32,
}

impl CohereGenerator {
    pub fn new(client: Client, base_url: String, api_key: Option<String>, max_tokens: u32) -> Self {
        info!("Initialized CohereGenerator: base_url={}, max_tokens={}", base_url, max_tokens);
        Self {
            client,
            base_url,
            api_key,
            max_tokens,
        }
    }
}

#[async_trait]
impl GenerationProvider for CohereGenerator {
    async fn generate(&self, prompt: &str) -> AppResult<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            error!("Generation API key not configured");
            AppError::Configuration("Generation service not configured.".to_string())
        })?;

        let url = endpoint(&self.base_url, "generate");
        debug!("Sending generation request: provider=cohere, prompt_len={}", prompt.len());

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&CohereGenerateRequest {
                prompt,
                max_tokens: self.max_tokens,
            })
            .send()
            .await
            .map_err(|e| {
                error!("Cohere API request failed: {}", e);
                generation_failed(FETCH_FAILED)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Cohere API error: status={}, body={}", status, body);
            return Err(generation_failed(FETCH_FAILED));
        }

        let data: Value = response.json().await.map_err(|e| {
            error!("Cohere API returned unreadable body: {}", e);
            generation_failed(FETCH_FAILED)
        })?;

        match data.get("text").and_then(|v| v.as_str()) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => {
                error!("Cohere API returned no valid text: {}", data);
                Err(generation_failed(INVALID_RESPONSE))
            }
        }
    }

    fn name(&self) -> &str {
        "cohere"
    }
}
