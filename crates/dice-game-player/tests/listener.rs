//! Router tests for the inbound listener.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use dice_game_core::{
    transport::PEER_TOKEN_HEADER, Envelope, GameSession, Mailbox, MemoryTransport, Message,
    MessageKind, Role, SessionConfig,
};
use dice_game_player::{create_router, ListenerState};
use std::sync::Arc;
use tower::ServiceExt;

fn listener(token: Option<&str>) -> (Router, Arc<Mailbox>) {
    let (transport, _) = MemoryTransport::pair();
    let session = GameSession::new(
        SessionConfig::new(3, Role::Verifier).with_name("Bob"),
        transport,
    );
    let inbox = Arc::new(Mailbox::new());
    let mut state = ListenerState::new(inbox.clone(), session.subscribe());
    if let Some(token) = token {
        state = state.with_token(token);
    }
    (create_router(Arc::new(state)), inbox)
}

fn post_message(body: String, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/messages").header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header(PEER_TOKEN_HEADER, token);
    }
    builder.body(Body::from(body)).unwrap()
}

fn throw(round: u32, value: u64) -> String {
    serde_json::to_string(&Envelope::new(round, Message::DieThrow { value })).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = listener(None);
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), 1024).await.unwrap();
    assert_eq!(&body[..], b"ok");
}

#[tokio::test]
async fn test_message_is_deposited() {
    let (app, inbox) = listener(None);
    let response = app.oneshot(post_message(throw(1, 4), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let envelope = inbox.take(MessageKind::DieThrow).await.unwrap();
    assert_eq!(envelope.round, 1);
    assert_eq!(envelope.message, Message::DieThrow { value: 4 });
}

#[tokio::test]
async fn test_second_message_of_a_kind_is_conflict() {
    let (app, _inbox) = listener(None);
    let first = app
        .clone()
        .oneshot(post_message(throw(1, 4), None))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = app.oneshot(post_message(throw(2, 5), None)).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_closed_inbox_is_unavailable() {
    let (app, inbox) = listener(None);
    inbox.close();
    let response = app.oneshot(post_message(throw(1, 4), None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let (app, inbox) = listener(None);
    let response = app
        .clone()
        .oneshot(post_message("{not json".to_string(), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let unknown_kind = r#"{"round":1,"message":{"kind":"surrender"}}"#.to_string();
    let response = app.oneshot(post_message(unknown_kind, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing reached the session
    inbox.deposit(Envelope::new(1, Message::DieThrow { value: 1 })).unwrap();
}

#[tokio::test]
async fn test_token_is_enforced() {
    let (app, _inbox) = listener(Some("s3cret"));

    let missing = app
        .clone()
        .oneshot(post_message(throw(1, 2), None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app
        .clone()
        .oneshot(post_message(throw(1, 2), Some("guess")))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let right = app
        .oneshot(post_message(throw(1, 2), Some("s3cret")))
        .await
        .unwrap();
    assert_eq!(right.status(), StatusCode::ACCEPTED);
}

#[tokio::test]
async fn test_status_snapshot() {
    let (app, _) = listener(None);
    let response = app
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
    let status: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(status["name"], "Bob");
    assert_eq!(status["phase"], "Playing");
    assert_eq!(status["rounds"], 3);
    assert_eq!(status["next_role"], "Verifier");
    assert_eq!(status["records"].as_array().unwrap().len(), 0);
}
