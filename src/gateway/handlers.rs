use axum::{
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};

use super::{AppState, ChatBody, ResetBody, SpeechBody};
use crate::dialogue::TurnReply;
use crate::config::{MAX_BODY_BYTES, REQUEST_TIMEOUT};
use crate::error::{ParleyError, RequestError, ValidationError};
use crate::speech::SynthesizedAudio;
use crate::storage::KvBackend;

/// `{ "error", "code" }` with the status mapped from the error.
pub(super) fn error_response(err: &ParleyError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(code = err.code(), status = status.as_u16(), error = %err, "request failed");
    } else {
        tracing::warn!(code = err.code(), status = status.as_u16(), error = %err, "request rejected");
    }
    let body = serde_json::json!({
        "error": err.public_message(),
        "code": err.code(),
    });
    (status, Json(body)).into_response()
}

/// Rewrite the bare 413/408 produced by the body limit and timeout layers
/// into the `{ "error", "code" }` shape. JSON responses pass through.
pub(super) async fn structure_layer_rejection(response: Response) -> Response {
    let err = match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => RequestError::BodyTooLarge { max: MAX_BODY_BYTES },
        StatusCode::REQUEST_TIMEOUT => RequestError::TimedOut {
            secs: REQUEST_TIMEOUT.as_secs(),
        },
        _ => return response,
    };
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if is_json {
        return response;
    }
    error_response(&err.into())
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ParleyError> {
    body.map(|Json(inner)| inner).map_err(|rejection| {
        // A chunked body overrunning the limit surfaces here, not in the layer.
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            RequestError::BodyTooLarge { max: MAX_BODY_BYTES }.into()
        } else {
            ValidationError::MalformedBody(rejection.body_text()).into()
        }
    })
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value.ok_or(ValidationError::MissingField(field))
}

/// GET /health: storage backend and reachability
pub(super) async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    let healthy = state.storage.ping().await.is_ok();
    let body = serde_json::json!({
        "status": if healthy { "ok" } else { "degraded" },
        "storage": {
            "backend": state.storage.active_backend(),
            "demoted": state.storage.is_demoted(),
            "healthy": healthy,
        },
    });
    Json(body)
}

async fn chat(
    state: &AppState,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Result<TurnReply, ParleyError> {
    let body = parse_body(body)?;
    let session_id = required(body.session_id, "sessionId")?;
    let message = required(body.message, "message")?;
    state.orchestrator.resolve_turn(&session_id, &message).await
}

/// POST /chat: one dialogue turn
pub(super) async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatBody>, JsonRejection>,
) -> Response {
    match chat(&state, body).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn speech(
    state: &AppState,
    body: Result<Json<SpeechBody>, JsonRejection>,
) -> Result<SynthesizedAudio, ParleyError> {
    let body = parse_body(body)?;
    let session_id = required(body.session_id, "sessionId")?;
    let text = required(body.text, "text")?;
    state.speech.synthesize_speech(&session_id, &text).await
}

/// POST /speech: audio in the session persona's voice
pub(super) async fn handle_speech(
    State(state): State<AppState>,
    body: Result<Json<SpeechBody>, JsonRejection>,
) -> Response {
    match speech(&state, body).await {
        Ok(audio) => ([(header::CONTENT_TYPE, audio.content_type)], audio.bytes).into_response(),
        Err(e) => error_response(&e),
    }
}

async fn reset(
    state: &AppState,
    body: Result<Json<ResetBody>, JsonRejection>,
) -> Result<serde_json::Value, ParleyError> {
    let body = parse_body(body)?;
    let session_id = required(body.session_id, "sessionId")?;
    let record = state.orchestrator.reset_session(&session_id).await?;
    Ok(serde_json::json!({
        "status": "ok",
        "persona": record.persona,
    }))
}

/// POST /session/reset: forget persona choice, name and history
pub(super) async fn handle_reset(
    State(state): State<AppState>,
    body: Result<Json<ResetBody>, JsonRejection>,
) -> Response {
    match reset(&state, body).await {
        Ok(body) => Json(body).into_response(),
        Err(e) => error_response(&e),
    }
}
