//! Bot API client and polling loop against a mock server.

mod common;

use std::time::{Duration, Instant};

use assert_matches::assert_matches;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lightdesk_bot::dispatcher::Dispatcher;
use lightdesk_bot::menu::WELCOME;
use lightdesk_bot::poller::{self, BackoffConfig};
use lightdesk_bot::telegram::{TelegramApi, TelegramError};

use common::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const TOKEN: &str = "123:abc";

fn api(server: &MockServer) -> TelegramApi {
    TelegramApi::with_client(reqwest::Client::new(), server.uri(), TOKEN)
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "ok": true, "result": result }))
}

fn start_update(update_id: i64, user: i64) -> serde_json::Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": 1,
            "chat": {"id": user, "type": "private"},
            "from": {"id": user, "is_bot": false, "first_name": "Jane"},
            "text": "/start"
        }
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_updates_sends_offset_and_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getUpdates"))
        .and(body_partial_json(json!({"offset": 5, "timeout": 30})))
        .respond_with(ok(json!([start_update(5, USER)])))
        .expect(1)
        .mount(&server)
        .await;

    let updates = api(&server).get_updates(5, 30).await.unwrap();

    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].update_id, 5);
}

#[tokio::test]
async fn error_envelope_becomes_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let err = api(&server).send_message(1, "hi", None).await.unwrap_err();

    assert_matches!(err, TelegramError::ApiError { code: 400, ref description } if description.contains("chat not found"));
}

#[tokio::test]
async fn unchanged_keyboard_edit_is_ok() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/editMessageReplyMarkup"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: message is not modified"
        })))
        .mount(&server)
        .await;

    api(&server)
        .edit_message_reply_markup(1, 2, json!({"inline_keyboard": []}))
        .await
        .unwrap();
}

#[tokio::test]
async fn download_resolves_path_then_fetches_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getFile"))
        .and(body_partial_json(json!({"file_id": "f1"})))
        .respond_with(ok(json!({"file_id": "f1", "file_path": "documents/rider.pdf"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/file/bot123:abc/documents/rider.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF".to_vec()))
        .mount(&server)
        .await;

    let bytes = api(&server).download_file("f1").await.unwrap();

    assert_eq!(bytes, b"%PDF");
}

#[tokio::test]
async fn download_without_path_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getFile"))
        .respond_with(ok(json!({"file_id": "f1"})))
        .mount(&server)
        .await;

    let err = api(&server).download_file("f1").await.unwrap_err();

    assert_matches!(err, TelegramError::NoFilePath(ref id) if id == "f1");
}

// ---------------------------------------------------------------------------
// Polling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn poller_dispatches_updates_and_advances_offset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getUpdates"))
        .respond_with(ok(json!([start_update(7, USER)])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getUpdates"))
        .respond_with(ok(json!([])).set_delay(Duration::from_millis(20)))
        .mount(&server)
        .await;

    let h = Harness::new();
    let mut dispatcher = Dispatcher::new(h.state.clone());
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        canceller.cancel();
    });

    let offset = poller::run(&api(&server), &mut dispatcher, 0, &BackoffConfig::default(), &cancel).await;
    dispatcher.shutdown().await;

    assert_eq!(offset, 8);
    assert_eq!(h.messenger.last_prompt().text, WELCOME);
}

#[tokio::test]
async fn poller_backs_off_and_stops_on_cancel() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/bot123:abc/getUpdates"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let h = Harness::new();
    let mut dispatcher = Dispatcher::new(h.state.clone());
    let backoff = BackoffConfig {
        initial_delay: Duration::from_secs(10),
        ..Default::default()
    };
    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let offset = poller::run(&api(&server), &mut dispatcher, 0, &backoff, &cancel).await;

    assert_eq!(offset, 0);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
    assert_eq!(dispatcher.active_chats(), 0);
}
