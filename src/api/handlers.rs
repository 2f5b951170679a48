//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ChatRequest, ChatResponse, ErrorResponse, MessageView, SessionCreatedResponse,
    SessionResponse, SuccessResponse, TeleDataQuery,
};
use super::AppState;
use crate::chat::{ChatSession, SessionError, Submission};
use crate::responder::{ResponderError, TeleDataAnswer, APOLOGY_PREFIX};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // One-shot question answering
        .route("/api/teleData", post(tele_data))
        // Chat sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/api/sessions/:id/stream", get(stream_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// teleData
// ============================================================

async fn tele_data(
    State(state): State<AppState>,
    Json(req): Json<TeleDataQuery>,
) -> Result<Json<TeleDataAnswer>, AppError> {
    let question = req
        .question
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("question is required".to_string()))?;

    let timeout = state.sessions.response_timeout();
    let outcome = tokio::time::timeout(timeout, state.sessions.responder().answer(&question))
        .await
        .unwrap_or_else(|_| Err(ResponderError::Timeout(timeout)));

    // Backend failures still produce an answer a client can display
    let answer = match outcome {
        Ok(answer) => answer,
        Err(e) => TeleDataAnswer {
            error: Some(e.to_string()),
            ..TeleDataAnswer::plain(&question, format!("{APOLOGY_PREFIX}: {e}"))
        },
    };
    Ok(Json(answer))
}

// ============================================================
// Sessions
// ============================================================

async fn find_session(state: &AppState, id: &str) -> Result<Arc<ChatSession>, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

async fn create_session(State(state): State<AppState>) -> Json<SessionCreatedResponse> {
    let session = state.sessions.create().await;
    Json(SessionCreatedResponse {
        id: session.id().to_string(),
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = find_session(&state, &id).await?;
    let (messages, pending) = session.snapshot();

    Ok(Json(SessionResponse {
        id,
        messages: messages.iter().map(MessageView::from).collect(),
        pending,
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if state.sessions.remove(&id).await {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(AppError::NotFound(format!("Session not found: {id}")))
    }
}

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let session = find_session(&state, &id).await?;

    let accepted = match session.submit(&req.text) {
        // The response task runs on its own; progress is reported over SSE
        Ok(Submission::Accepted(_pending)) => true,
        Ok(Submission::Ignored) => false,
        Err(e @ SessionError::ResponsePending) => return Err(AppError::Conflict(e.to_string())),
    };

    Ok(Json(ChatResponse { accepted }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let session = find_session(&state, &id).await?;
    session.reset();
    Ok(Json(SuccessResponse { success: true }))
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = find_session(&state, &id).await?;

    // Subscribe before the snapshot so no event falls between the two
    let broadcast_rx = session.subscribe();
    let (messages, pending) = session.snapshot();

    Ok(sse_stream(id, &messages, pending, broadcast_rx))
}

async fn get_version() -> &'static str {
    concat!("teledesk ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
