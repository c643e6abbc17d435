use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::services::events::EventServiceError;
use crate::services::form::FormError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid form: {0}")]
    Form(#[from] FormError),

    #[error("Event service unavailable: {0}")]
    EventService(#[from] EventServiceError),

    #[error("Template error: {0}")]
    Render(#[from] askama::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Form(e) => (StatusCode::BAD_REQUEST, "INVALID_FORM", e.to_string()),
            AppError::EventService(e) => {
                tracing::error!("Event service error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "EVENT_SERVICE_ERROR",
                    e.to_string(),
                )
            }
            AppError::Render(e) => {
                tracing::error!("Template error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "RENDER_ERROR",
                    "Failed to render page".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
