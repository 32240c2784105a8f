use axum::response::IntoResponse;
use axum::Json;
use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::services::llm_service::LlmError;

/// Request-level error taxonomy. Trend-provider failures never show up here:
/// they are absorbed into the prompt by the chat service.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Llm(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match self {
            AppError::Validation(msg) | AppError::Internal(msg) => msg,
            AppError::Llm(err) => err.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
