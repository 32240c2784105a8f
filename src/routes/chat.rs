use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use tracing::info;

use crate::errors::AppError;
use crate::models::{ChatRequest, ChatResponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(chat))
}

/// POST /chat
///
/// Request body: {"message": "Was sind die aktuellen Trends?"}
/// Returns: {"response": …, "has_trend_data": …, "query_type": …}
///
/// A missing body or missing `message` key is a 400 with an `error` field.
async fn chat(
    State(state): State<AppState>,
    payload: Option<Json<ChatRequest>>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = payload
        .and_then(|Json(request)| request.message)
        .ok_or_else(|| AppError::Validation("No message provided".to_string()))?;

    info!("POST /chat - message length: {}", message.len());

    let response = state.chat_service.handle_message(&message).await?;

    info!(
        "Chat turn answered (query_type: {}, has_trend_data: {})",
        response.query_type, response.has_trend_data
    );

    Ok(Json(response))
}
