use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::interface::Translator;
use crate::config::TranslationConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
struct GoogleTranslateBody<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

/// Google Cloud Translation v2.
///
/// Request: `POST <base_url>?key=<key>` with `{ q, source, target, format: "text" }`.
/// Response: `{ data: { translations: [{ translatedText }] } }`, only the first
/// entry is used.
pub struct GoogleTranslator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    source_lang: String,
}

impl GoogleTranslator {
    pub fn new(client: Client, config: &TranslationConfig) -> Self {
        info!(
            "Initialized GoogleTranslator: base_url={}, source={}, key configured={}",
            config.base_url,
            config.source_lang,
            config.api_key.is_some()
        );
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            source_lang: config.source_lang.clone(),
        }
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(&self, text: &str, target_lang: &str) -> AppResult<String> {
        if text.is_empty() || target_lang.is_empty() {
            warn!(
                "Missing parameters: text empty={}, target_lang={:?}",
                text.is_empty(),
                target_lang
            );
            return Err(AppError::MissingParameters);
        }

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            error!("Translation API key not configured");
            AppError::Configuration("Translation service not configured.".to_string())
        })?;

        debug!("Translating {} chars to {}", text.len(), target_lang);

        let response = self
            .client
            .post(&self.base_url)
            .query(&[("key", api_key)])
            .json(&GoogleTranslateBody {
                q: text,
                source: &self.source_lang,
                target: target_lang,
                format: "text",
            })
            .send()
            .await
            .map_err(|e| {
                // The URL carries the key, keep it out of the log line.
                error!("Translation request failed: {}", e.without_url());
                AppError::Transport
            })?;

        let status = response.status();
        info!("Translation API response: method=POST, status={}, target={}", status, target_lang);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Translation API error: status={}, body={}", status, body);
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message: format!(
                    "Translation API error: {}",
                    status.canonical_reason().unwrap_or("unknown status")
                ),
            });
        }

        let data: Value = response.json().await.map_err(|e| {
            error!("Translation API returned unreadable body: {}", e.without_url());
            AppError::UnexpectedFormat
        })?;

        match data.pointer("/data/translations/0/translatedText").and_then(|v| v.as_str()) {
            Some(translated) if !translated.is_empty() => Ok(translated.to_string()),
            _ => {
                error!("Unexpected translation response format: {}", data);
                Err(AppError::UnexpectedFormat)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn translator(server: &Server, api_key: Option<&str>) -> GoogleTranslator {
        let config = TranslationConfig {
            base_url: format!("{}/language/translate/v2", server.url()),
            api_key: api_key.map(String::from),
            ..TranslationConfig::default()
        };
        GoogleTranslator::new(Client::new(), &config)
    }

    #[tokio::test]
    async fn returns_first_translation() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/language/translate/v2")
            .match_query(Matcher::UrlEncoded("key".into(), "secret".into()))
            .match_body(Matcher::Json(json!({
                "q": "How are you?",
                "source": "en",
                "target": "bn",
                "format": "text"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "data": { "translations": [{ "translatedText": "কেমন আছো" }] } }).to_string())
            .create_async()
            .await;

        let out = translator(&server, Some("secret")).translate("How are you?", "bn").await.unwrap();
        assert_eq!(out, "কেমন আছো");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_parameters_skip_network() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let t = translator(&server, Some("secret"));
        assert_eq!(t.translate("", "bn").await.unwrap_err(), AppError::MissingParameters);
        assert_eq!(t.translate("hello", "").await.unwrap_err(), AppError::MissingParameters);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_key_is_configuration_error() {
        let mut server = Server::new_async().await;
        let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;

        let err = translator(&server, None).translate("hello", "bn").await.unwrap_err();
        assert_eq!(
            err,
            AppError::Configuration("Translation service not configured.".to_string())
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn upstream_status_is_propagated() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/language/translate/v2")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(json!({ "error": { "message": "API key not valid" } }).to_string())
            .create_async()
            .await;

        let err = translator(&server, Some("bad")).translate("hello", "bn").await.unwrap_err();
        assert_eq!(
            err,
            AppError::Upstream {
                status: 403,
                message: "Translation API error: Forbidden".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unexpected_shape_is_reported() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/language/translate/v2")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({ "data": { "translations": [] } }).to_string())
            .create_async()
            .await;

        let err = translator(&server, Some("k")).translate("hello", "bn").await.unwrap_err();
        assert_eq!(err, AppError::UnexpectedFormat);
    }

    #[tokio::test]
    async fn non_json_body_is_unexpected_format() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/language/translate/v2")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = translator(&server, Some("k")).translate("hello", "bn").await.unwrap_err();
        assert_eq!(err, AppError::UnexpectedFormat);
    }

    #[tokio::test]
    async fn whitespace_text_is_forwarded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/language/translate/v2")
            .match_query(Matcher::Any)
            .match_body(Matcher::PartialJson(json!({ "q": " ", "target": "bn" })))
            .with_status(200)
            .with_body(json!({ "data": { "translations": [{ "translatedText": " " }] } }).to_string())
            .create_async()
            .await;

        let out = translator(&server, Some("k")).translate(" ", "bn").await.unwrap();
        assert_eq!(out, " ");
        mock.assert_async().await;
    }
}
