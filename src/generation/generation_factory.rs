use std::sync::Arc;
use anyhow::Result;
use reqwest::Client;
use tracing::info;

use crate::config::GenerationConfig;
use super::generation_interface::GenerationProvider;
use super::cohere_generator::CohereGenerator;
use super::openai_generator::OpenAIGenerator;

/// Factory for creating generation providers
pub struct GenerationProviderFactory;

impl GenerationProviderFactory {
    /// Create the provider named by `config.provider`.
    ///
    /// # Arguments
    /// * `client` - Shared HTTP client (carries the request timeout)
    /// * `config` - Generation section of the configuration
    pub fn create(client: Client, config: &GenerationConfig) -> Result<Arc<dyn GenerationProvider>> {
        info!("Initializing generation provider: {}", config.provider);

        match config.provider.as_str() {
            "cohere" | "cohere_llm" => Ok(Arc::new(CohereGenerator::new(
                client,
                config.base_url.clone(),
                config.api_key.clone(),
                config.max_tokens,
            ))),
            "openai" | "openai_llm" | "gpt" => Ok(Arc::new(OpenAIGenerator::new(
                client,
                config.base_url.clone(),
                config.api_key.clone(),
                config.model.clone(),
                config.max_tokens,
            ))),
            other => Err(anyhow::anyhow!("Unsupported generation provider: {}", other)),
        }
    }
}
