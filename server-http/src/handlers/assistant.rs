use crate::api::requests::AskRequest;
use crate::api::responses::AskResponse;
use crate::api::{backoffice_error, ErrorResponse};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use frontdesk::assistant::{ChatMessage, ChatRole, SYSTEM_PROMPT};
use tracing::warn;

/// POST /api/assistant
///
/// Answers are produced fresh on every call; only the hotel figures handed to
/// the assistant come from the cache.
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Some(assistant) = state.assistant.clone() else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Assistant is not configured")),
        ));
    };

    let question = req.question.trim();
    if question.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Question must not be empty")),
        ));
    }

    let snapshot = state
        .backoffice
        .snapshot()
        .await
        .map_err(backoffice_error)?;
    let context = serde_json::to_string_pretty(&snapshot).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new(e.to_string())),
        )
    })?;

    let mut history = req.history;
    history.push(ChatMessage::new(ChatRole::User, question));

    match assistant.complete(SYSTEM_PROMPT, &history, &context).await {
        Ok(answer) => Ok(Json(AskResponse { answer })),
        Err(e) => {
            warn!("assistant failed: {}", e);
            Err((StatusCode::BAD_GATEWAY, Json(ErrorResponse::new(e.to_string()))))
        }
    }
}
