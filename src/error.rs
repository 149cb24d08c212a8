use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the relays, the session controller and the HTTP layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Missing parameters: text and targetLang are required.")]
    MissingParameters,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// A credential or other required setting is absent.
    #[error("{0}")]
    Configuration(String),

    /// Generation provider failed; message is deliberately generic.
    #[error("{0}")]
    Generation(String),

    /// Upstream answered with a non-2xx status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("Unexpected translation response format.")]
    UnexpectedFormat,

    #[error("Translation failed due to server error.")]
    Transport,

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("An operation is already in progress for this session")]
    SessionBusy,

    #[error("No more scenarios available; refresh to start over")]
    NoMoreScenarios,
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingParameters | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::SessionBusy | AppError::NoMoreScenarios => StatusCode::CONFLICT,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::Configuration(_)
            | AppError::Generation(_)
            | AppError::UnexpectedFormat
            | AppError::Transport => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_statuses() {
        assert_eq!(AppError::MissingParameters.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            AppError::Configuration("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::SessionBusy.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::SessionNotFound("id".into()).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn upstream_status_is_forwarded() {
        let err = AppError::Upstream {
            status: 403,
            message: "Translation API error: Forbidden".into(),
        };
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Translation API error: Forbidden");
    }

    #[test]
    fn bogus_upstream_status_degrades_to_bad_gateway() {
        let err = AppError::Upstream { status: 42, message: "odd".into() };
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
