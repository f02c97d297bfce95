//! Webhook endpoint and update queue behaviour.
//!
//! Run with: cargo test --test webhook

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use teloxide::types::{Update, UpdateKind};
use tokio::sync::mpsc;
use tower::ServiceExt;

use pitara::api::QueryClient;
use pitara::config::{ApiConfig, Mode};
use pitara::handlers::Handlers;
use pitara::i18n::{self, Language};
use pitara::testing::{RecordingMessenger, Sent};
use pitara::webhook::{self, HEALTH_MESSAGE};

fn text_update_json(update_id: i64, chat_id: i64, text: &str) -> Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id * 10,
            "date": 1_700_000_000,
            "chat": {"id": chat_id, "type": "private", "first_name": "Ravi"},
            "from": {"id": chat_id, "is_bot": false, "first_name": "Ravi"},
            "text": text
        }
    })
}

fn callback_update_json(update_id: i64, user_id: i64, data: &str) -> Value {
    json!({
        "update_id": update_id,
        "callback_query": {
            "id": format!("cbq-{update_id}"),
            "from": {"id": user_id, "is_bot": false, "first_name": "Ravi"},
            "chat_instance": "ci",
            "data": data,
            "message": {
                "message_id": 900,
                "date": 1_700_000_000,
                "chat": {"id": user_id, "type": "private", "first_name": "Ravi"},
                "text": "menu"
            }
        }
    })
}

/// Parse from text like the webhook does; `from_value` loses the update kind.
fn parse_update(value: Value) -> Update {
    serde_json::from_str(&value.to_string()).unwrap()
}

fn text_update(update_id: i64, chat_id: i64, text: &str) -> Update {
    let update = parse_update(text_update_json(update_id, chat_id, text));
    assert!(matches!(update.kind, UpdateKind::Message(_)), "fixture is not a message: {update:?}");
    update
}

fn callback_update(update_id: i64, user_id: i64, data: &str) -> Update {
    let update = parse_update(callback_update_json(update_id, user_id, data));
    assert!(
        matches!(update.kind, UpdateKind::CallbackQuery(_)),
        "fixture is not a callback query: {update:?}"
    );
    update
}

fn post_update(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/telegram")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

fn handlers() -> Arc<Handlers<RecordingMessenger>> {
    // Only commands and callbacks go through here, so the API is never hit
    let api = QueryClient::new(&ApiConfig {
        story_base_url: "http://127.0.0.1:9".into(),
        activity_base_url: "http://127.0.0.1:9".into(),
        auth_token: None,
        connect_timeout: Duration::from_millis(200),
        pool_size: 1,
    })
    .unwrap();
    Arc::new(Handlers::new(RecordingMessenger::default(), api, Mode::Webhook))
}

#[tokio::test]
async fn test_healthcheck() {
    let (tx, _rx) = mpsc::channel(4);
    let response = webhook::router(tx)
        .oneshot(Request::builder().uri("/healthcheck").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], HEALTH_MESSAGE.as_bytes());
}

#[tokio::test]
async fn test_update_is_queued() {
    let (tx, mut rx) = mpsc::channel(4);
    let body = text_update_json(1, 42, "/start").to_string();
    let response = webhook::router(tx).oneshot(post_update(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let queued: Update = rx.try_recv().expect("update queued");
    assert!(matches!(queued.kind, UpdateKind::Message(_)));
}

#[tokio::test]
async fn test_malformed_body_is_acknowledged_and_dropped() {
    let (tx, mut rx) = mpsc::channel(4);
    let response = webhook::router(tx).oneshot(post_update("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_closed_queue_still_acknowledges() {
    let (tx, rx) = mpsc::channel(4);
    drop(rx);
    let body = text_update_json(1, 42, "hello").to_string();
    let response = webhook::router(tx).oneshot(post_update(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_get_on_update_path_is_rejected() {
    let (tx, _rx) = mpsc::channel(4);
    let response = webhook::router(tx)
        .oneshot(Request::builder().uri("/telegram").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_dispatcher_processes_in_queue_order_then_drains() {
    let handlers = handlers();
    let (tx, rx) = mpsc::channel(8);
    let dispatcher = webhook::spawn_dispatcher(handlers.clone(), rx, "pitara_bot".into(), 1);

    for update in [
        text_update(1, 1, "/start"),
        text_update(2, 2, "/help"),
        callback_update(3, 1, "lang_hi"),
    ] {
        tx.send(update).await.unwrap();
    }
    drop(tx);

    tokio::time::timeout(Duration::from_secs(5), dispatcher)
        .await
        .expect("dispatcher drained")
        .unwrap();

    let sent = handlers.messenger().take();
    let texts: Vec<&str> = sent
        .iter()
        .filter_map(|s| match s {
            Sent::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(
        texts,
        vec![
            i18n::WELCOME_BANNER,
            i18n::LANGUAGE_MENU_PROMPT,
            i18n::HELP_TEXT,
            i18n::persona_menu_prompt(Language::Hi),
        ]
    );
    assert!(sent.iter().any(|s| matches!(s, Sent::Answer { id, .. } if id == "cbq-3")));
    assert_eq!(handlers.sessions().language(1).await, Language::Hi);
}

#[tokio::test]
async fn test_dispatcher_with_parallel_permits_handles_everything() {
    let handlers = handlers();
    let (tx, rx) = mpsc::channel(2);
    let dispatcher = webhook::spawn_dispatcher(handlers.clone(), rx, "pitara_bot".into(), 4);

    for chat in 1..=6 {
        tx.send(text_update(chat, chat, "/help")).await.unwrap();
    }
    drop(tx);

    tokio::time::timeout(Duration::from_secs(5), dispatcher)
        .await
        .expect("dispatcher drained")
        .unwrap();

    let mut chats: Vec<i64> = handlers
        .messenger()
        .take()
        .into_iter()
        .filter_map(|s| match s {
            Sent::Text { chat_id, .. } => Some(chat_id),
            _ => None,
        })
        .collect();
    chats.sort();
    assert_eq!(chats, vec![1, 2, 3, 4, 5, 6]);
}
