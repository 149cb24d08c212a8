use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system_config: SystemConfig,
    #[serde(default)]
    pub generation_config: GenerationConfig,
    #[serde(default)]
    pub translation_config: TranslationConfig,
    #[serde(default)]
    pub prompt_config: PromptConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for every upstream HTTP call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Sessions untouched this long are dropped. 0 keeps them until deleted.
    #[serde(default = "default_session_idle_ttl_secs")]
    pub session_idle_ttl_secs: u64,
    /// Prebuilt UI to serve at `/`, if any.
    #[serde(default)]
    pub static_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// "cohere" or "openai"
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_translation_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    #[serde(default = "default_target_lang")]
    pub default_target_lang: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_scenario_list_prompt")]
    pub scenario_list: String,
    /// `{scenario}` is replaced by the selected title.
    #[serde(default = "default_scenario_detail_prompt")]
    pub scenario_detail: String,
    /// `{input}` is replaced by the user's message.
    #[serde(default = "default_chat_reply_prompt")]
    pub chat_reply: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_session_idle_ttl_secs() -> u64 {
    3600
}

fn default_generation_provider() -> String {
    "cohere".to_string()
}

fn default_generation_base_url() -> String {
    "https://api.cohere.ai".to_string()
}

fn default_max_tokens() -> u32 {
    100
}

fn default_translation_base_url() -> String {
    "https://translation.googleapis.com/language/translate/v2".to_string()
}

fn default_source_lang() -> String {
    "en".to_string()
}

fn default_target_lang() -> String {
    "bn".to_string()
}

fn default_scenario_list_prompt() -> String {
    "Suggest a list of common English conversation scenarios.".to_string()
}

fn default_scenario_detail_prompt() -> String {
    "Provide an English conversation for the scenario: \"{scenario}\".".to_string()
}

fn default_chat_reply_prompt() -> String {
    "Provide an English conversation for the scenario: \"{input}\".".to_string()
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            session_idle_ttl_secs: default_session_idle_ttl_secs(),
            static_dir: None,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            base_url: default_generation_base_url(),
            api_key: None,
            model: None,
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: default_translation_base_url(),
            api_key: None,
            source_lang: default_source_lang(),
            default_target_lang: default_target_lang(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            scenario_list: default_scenario_list_prompt(),
            scenario_detail: default_scenario_detail_prompt(),
            chat_reply: default_chat_reply_prompt(),
        }
    }
}

impl PromptConfig {
    pub fn scenario_detail_for(&self, scenario: &str) -> String {
        self.scenario_detail.replace("{scenario}", scenario)
    }

    pub fn chat_reply_for(&self, input: &str) -> String {
        self.chat_reply.replace("{input}", input)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path))?;
        Self::parse(&content, path)
    }

    /// Parse `content`, picking JSON or YAML from the extension of `path`.
    pub fn parse(content: &str, path: &str) -> Result<Self> {
        let content = substitute_env_vars(content);

        let path_lower = path.to_lowercase();
        let mut config: Config = if path_lower.ends_with(".json") {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.apply_env_overrides();
        config.normalize();
        Ok(config)
    }

    /// Credentials from the environment win over whatever the file says.
    fn apply_env_overrides(&mut self) {
        if let Some(key) =
            env_non_empty("GENERATION_API_KEY").or_else(|| env_non_empty("COHERE_API_KEY"))
        {
            self.generation_config.api_key = Some(key);
        }
        if let Some(key) = env_non_empty("GOOGLE_TRANSLATE_API_KEY") {
            self.translation_config.api_key = Some(key);
        }
    }

    // Blank keys count as absent so the relays report a configuration error.
    fn normalize(&mut self) {
        for key in [
            &mut self.generation_config.api_key,
            &mut self.translation_config.api_key,
        ] {
            if key.as_deref().map(|k| k.trim().is_empty()).unwrap_or(false) {
                *key = None;
            }
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Replace `${VAR_NAME}` with the variable's value, or nothing when unset.
pub fn substitute_env_vars(content: &str) -> String {
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("valid placeholder pattern");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}
