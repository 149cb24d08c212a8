use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_routes(state: &AppState) -> Router<AppState> {
    let router = Router::new()
        // Health check
        .route("/api/health", get(handlers::health_check))

        // Relays
        .route(
            "/generate",
            post(handlers::generate).fallback(handlers::method_not_allowed),
        )
        .route(
            "/translate",
            post(handlers::translate).fallback(handlers::method_not_allowed),
        )

        // Session API
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/:id",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/:id/scenarios/more", post(handlers::load_more_scenarios))
        .route("/api/sessions/:id/scenarios/refresh", post(handlers::refresh_scenarios))
        .route("/api/sessions/:id/scenarios/select", post(handlers::select_scenario))
        .route("/api/sessions/:id/back", post(handlers::back_to_scenarios))
        .route("/api/sessions/:id/messages", post(handlers::send_message));

    // Prebuilt UI, if configured
    match &state.config.system_config.static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}

/// Full application with middleware and state attached.
pub fn build_app(state: AppState) -> Router {
    create_routes(&state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::{AppError, AppResult};
    use crate::generation::GenerationProvider;
    use crate::translate::Translator;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct EchoGenerator {
        fail: bool,
    }

    #[async_trait]
    impl GenerationProvider for EchoGenerator {
        async fn generate(&self, prompt: &str) -> AppResult<String> {
            if self.fail {
                return Err(AppError::Generation("Failed to fetch generation response".into()));
            }
            if prompt.starts_with("Suggest") {
                Ok("At a Restaurant\n\nAsking for Directions".into())
            } else {
                Ok(format!("echo: {}", prompt))
            }
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    /// Mimics the upstream contract: a fixed Bangla phrase, or a 403 for "forbidden".
    #[derive(Default)]
    struct StubTranslator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Translator for StubTranslator {
        async fn translate(&self, text: &str, target_lang: &str) -> AppResult<String> {
            if text.is_empty() || target_lang.is_empty() {
                return Err(AppError::MissingParameters);
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text == "forbidden" {
                return Err(AppError::Upstream {
                    status: 403,
                    message: "Translation API error: Forbidden".into(),
                });
            }
            Ok("কেমন আছো".into())
        }
    }

    fn app_with(fail_generation: bool) -> (Router, Arc<StubTranslator>) {
        let translator = Arc::new(StubTranslator::default());
        let state = AppState::with_providers(
            Config::default(),
            Arc::new(EchoGenerator { fail: fail_generation }),
            translator.clone(),
        );
        (build_app(state), translator)
    }

    async fn call(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                request = request.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = app.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn translate_rejects_non_post_with_json() {
        let (app, _) = app_with(false);
        let (status, body) = call(app, "GET", "/translate", None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Method not allowed");
    }

    #[tokio::test]
    async fn translate_missing_parameters_is_400() {
        let (app, translator) = app_with(false);
        let (status, body) = call(app, "POST", "/translate", Some(json!({ "text": "hello" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Missing parameters"));
        assert_eq!(translator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn translate_garbage_body_is_400() {
        let (app, _) = app_with(false);
        let request = Request::builder()
            .method("POST")
            .uri("/translate")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn translate_success_shape() {
        let (app, _) = app_with(false);
        let (status, body) = call(
            app,
            "POST",
            "/translate",
            Some(json!({ "text": "How are you?", "targetLang": "bn" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "translatedText": "কেমন আছো" }));
    }

    #[tokio::test]
    async fn translate_forwards_upstream_status() {
        let (app, _) = app_with(false);
        let (status, body) = call(
            app,
            "POST",
            "/translate",
            Some(json!({ "text": "forbidden", "targetLang": "bn" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Translation API error: Forbidden");
    }

    #[tokio::test]
    async fn generate_returns_text() {
        let (app, _) = app_with(false);
        let (status, body) = call(app, "POST", "/generate", Some(json!({ "prompt": "hi" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "text": "echo: hi" }));
    }

    #[tokio::test]
    async fn generate_failure_is_500() {
        let (app, _) = app_with(true);
        let (status, body) = call(app, "POST", "/generate", Some(json!({ "prompt": "hi" }))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch generation response");
    }

    #[tokio::test]
    async fn generate_garbage_body_is_500() {
        let (app, _) = app_with(false);
        let request = Request::builder()
            .method("POST")
            .uri("/generate")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Failed to fetch generation response" }));
    }

    #[tokio::test]
    async fn session_flow_over_http() {
        let (app, _) = app_with(false);

        let (status, created) = call(app.clone(), "POST", "/api/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["view"], "scenario_list");
        assert_eq!(created["has_more"], true);
        let id = created["session_id"].as_str().unwrap().to_string();

        let (status, loaded) =
            call(app.clone(), "POST", &format!("/api/sessions/{}/scenarios/more", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded["scenarios"], json!(["At a Restaurant", "Asking for Directions"]));
        assert_eq!(loaded["status"], "idle");

        let (status, opened) = call(
            app.clone(),
            "POST",
            &format!("/api/sessions/{}/scenarios/select", id),
            Some(json!({ "scenario": "At a Restaurant" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(opened["view"], "conversation");
        assert_eq!(opened["scenario_details"][0]["translation"], "কেমন আছো");

        let (_, back) = call(app.clone(), "POST", &format!("/api/sessions/{}/back", id), None).await;
        assert_eq!(back["view"], "scenario_list");

        let (status, _) = call(app.clone(), "DELETE", &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = call(app, "GET", &format!("/api/sessions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains(&id));
    }

    #[tokio::test]
    async fn send_message_requires_body() {
        let (app, _) = app_with(false);
        let (_, created) = call(app.clone(), "POST", "/api/sessions", None).await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let (status, _) = call(app.clone(), "POST", &format!("/api/sessions/{}/messages", id), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, state) = call(
            app,
            "POST",
            &format!("/api/sessions/{}/messages", id),
            Some(json!({ "text": "Ordering coffee" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state["messages"][1]["sender"], "bot");
        assert_eq!(state["messages"][1]["text"], "কেমন আছো");
    }

    #[tokio::test]
    async fn health_reports_provider() {
        let (app, _) = app_with(false);
        let (status, body) = call(app, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["generation_provider"], "echo");
    }
}
