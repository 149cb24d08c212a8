use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, StatusCode, Uri},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::generation::{generation_failed, FETCH_FAILED};
use crate::session::{ChatState, View};
use crate::state::AppState;
use crate::translate::{TranslateRequest, TranslateResponse};

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectScenarioRequest {
    pub scenario: String,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
}

/// Session state as returned to the UI, with the pane to display.
#[derive(Debug, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub state: ChatState,
    pub view: View,
}

impl From<ChatState> for SessionView {
    fn from(state: ChatState) -> Self {
        let view = state.view();
        Self { state, view }
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "generation_provider": state.generator.name(),
        "sessions": state.sessions.session_count()
    }))
}

pub async fn method_not_allowed(method: Method, uri: Uri) -> AppError {
    warn!("Invalid method: {} {}", method, uri.path());
    AppError::MethodNotAllowed
}

pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> AppResult<Json<GenerateResponse>> {
    // This route only ever reports success or a generic generation failure.
    let request = payload.map(|Json(body)| body).map_err(|rejection| {
        warn!("Unreadable generate body: {}", rejection.body_text());
        generation_failed(FETCH_FAILED)
    })?;
    let text = state.generator.generate(&request.prompt).await?;
    Ok(Json(GenerateResponse { text }))
}

pub async fn translate(
    State(state): State<AppState>,
    payload: Result<Json<TranslateRequest>, JsonRejection>,
) -> AppResult<Json<TranslateResponse>> {
    info!("Received translation request: POST /translate");

    // An unreadable body carries no parameters at all.
    let request = payload.map(|Json(body)| body).unwrap_or_default();
    let text = request.text.unwrap_or_default();
    let target_lang = request.target_lang.unwrap_or_default();

    let translated_text = state.translator.translate(&text, &target_lang).await?;
    Ok(Json(TranslateResponse { translated_text }))
}

pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionView>) {
    (StatusCode::CREATED, Json(state.sessions.create().into()))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionView>> {
    Ok(Json(state.sessions.get(&session_id)?.into()))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<StatusCode> {
    state.sessions.remove(&session_id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn load_more_scenarios(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionView>> {
    Ok(Json(state.sessions.load_more(&session_id).await?.into()))
}

pub async fn refresh_scenarios(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionView>> {
    Ok(Json(state.sessions.refresh(&session_id).await?.into()))
}

pub async fn select_scenario(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<SelectScenarioRequest>, JsonRejection>,
) -> AppResult<Json<SessionView>> {
    let request = json_body(payload)?;
    Ok(Json(state.sessions.select(&session_id, &request.scenario).await?.into()))
}

pub async fn back_to_scenarios(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> AppResult<Json<SessionView>> {
    Ok(Json(state.sessions.back(&session_id)?.into()))
}

pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> AppResult<Json<SessionView>> {
    let request = json_body(payload)?;
    Ok(Json(state.sessions.send(&session_id, &request.text).await?.into()))
}
