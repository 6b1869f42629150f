//! Inbound listener: receives the peer's messages and exposes session status.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dice_game_core::{
    transport::PEER_TOKEN_HEADER, Envelope, Mailbox, SessionStatus, TransportError,
};
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Application error type
#[derive(Debug)]
pub struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

impl From<TransportError> for AppError {
    fn from(e: TransportError) -> Self {
        let status = match e {
            TransportError::SlotOccupied(_) => StatusCode::CONFLICT,
            TransportError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            TransportError::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError(status, e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError(rejection.status(), rejection.body_text())
    }
}

/// Listener state shared by all handlers
pub struct ListenerState {
    inbox: Arc<Mailbox>,
    token: Option<String>,
    status: watch::Receiver<SessionStatus>,
}

impl ListenerState {
    pub fn new(inbox: Arc<Mailbox>, status: watch::Receiver<SessionStatus>) -> Self {
        Self {
            inbox,
            token: None,
            status,
        }
    }

    /// Require every inbound message to carry `token`
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let Some(expected) = &self.token else {
            return Ok(());
        };
        let presented = headers
            .get(PEER_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if presented.as_bytes() == expected.as_bytes() {
            Ok(())
        } else {
            Err(TransportError::Unauthorized.into())
        }
    }
}

// === Handlers ===

async fn receive_message(
    State(state): State<Arc<ListenerState>>,
    headers: HeaderMap,
    body: Result<Json<Envelope>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    if let Err(e) = state.authorize(&headers) {
        warn!("Refused message without a valid peer token");
        return Err(e);
    }
    let Json(envelope) = body?;
    debug!(kind = %envelope.kind(), round = envelope.round, "message received");

    state.inbox.deposit(envelope).map_err(|e| {
        warn!("Refused message: {}", e);
        AppError::from(e)
    })?;
    Ok(StatusCode::ACCEPTED)
}

async fn health() -> &'static str {
    "ok"
}

async fn get_status(State(state): State<Arc<ListenerState>>) -> Json<SessionStatus> {
    Json(state.status.borrow().clone())
}

pub fn create_router(state: Arc<ListenerState>) -> Router {
    Router::new()
        .route("/messages", post(receive_message))
        .route("/health", get(health))
        .route("/api/status", get(get_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
