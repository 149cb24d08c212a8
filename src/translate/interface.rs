use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;

/// Body accepted by `POST /translate`. Both fields are optional on the wire so a
/// missing one is reported as missing parameters rather than a decode failure.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub target_lang: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    pub translated_text: String,
}

/// A remote translation provider. Source language is fixed by the implementation.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_lang`. Missing arguments fail before any
    /// network traffic; nothing is retried.
    async fn translate(&self, text: &str, target_lang: &str) -> AppResult<String>;
}
