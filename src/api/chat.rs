use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::error::ApiError;
use crate::models::{ChatRequest, ChatResponse};
use crate::state::AppState;

/// POST /chat/ - Answer a question from Wikipedia content.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let req = match body {
        Ok(Json(value)) => validate_chat_request(&value)?,
        Err(rejection) => return Err(ApiError::ChatValidation(vec![rejection.body_text()])),
    };

    let _permit = state
        .chat_semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::Unavailable)?;

    tracing::info!("Processing chat query ({} chars)", req.query.chars().count());

    let response = state.chat.query(&req.query).await.map_err(|e| {
        tracing::error!("Failed to construct chat service: {e:#}");
        ApiError::Unexpected(e.to_string())
    })?;

    Ok(Json(ChatResponse { response }))
}

/// `query` must be present, a string, and non-empty.
fn validate_chat_request(value: &Value) -> Result<ChatRequest, ApiError> {
    let invalid = |msg: &str| ApiError::ChatValidation(vec![msg.to_string()]);

    let Some(object) = value.as_object() else {
        return Err(invalid("Input should be a valid dictionary"));
    };

    match object.get("query") {
        None => Err(invalid("Field 'query' is required")),
        Some(Value::String(query)) if query.is_empty() => {
            Err(invalid("query field: String should have at least 1 character"))
        }
        Some(Value::String(query)) => Ok(ChatRequest {
            query: query.clone(),
        }),
        Some(_) => Err(invalid("query field: Input should be a valid string")),
    }
}
