use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use reqwest::Client;

use crate::config::Config;
use crate::generation::{GenerationProvider, GenerationProviderFactory};
use crate::session::SessionController;
use crate::translate::{GoogleTranslator, Translator};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub generator: Arc<dyn GenerationProvider>,
    pub translator: Arc<dyn Translator>,
    pub sessions: Arc<SessionController>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.system_config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let generator = GenerationProviderFactory::create(client.clone(), &config.generation_config)?;
        let translator: Arc<dyn Translator> =
            Arc::new(GoogleTranslator::new(client, &config.translation_config));

        Ok(Self::with_providers(config, generator, translator))
    }

    /// Build state around already-constructed providers.
    pub fn with_providers(
        config: Config,
        generator: Arc<dyn GenerationProvider>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        let sessions = Arc::new(SessionController::new(
            generator.clone(),
            translator.clone(),
            config.prompt_config.clone(),
            config.translation_config.default_target_lang.clone(),
        ));

        Self {
            config: Arc::new(config),
            generator,
            translator,
            sessions,
        }
    }
}
