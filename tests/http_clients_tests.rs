use httpmock::prelude::*;
use serde_json::json;
use std::time::Duration;

use slack_recap::ai::{CompletionProvider, CompletionRequest, LlmClient, ProviderConfig, ProviderKind};
use slack_recap::api::dispatch::{HttpRelay, JobDispatcher};
use slack_recap::api::signature::{RELAY_SIGNATURE_HEADER, RELAY_TIMESTAMP_HEADER};
use slack_recap::core::models::{JobPayload, PlaceholderHandle};
use slack_recap::errors::SlackError;
use slack_recap::slack::{ChatTransport, SlackClient};

fn provider_config(base_url: String) -> ProviderConfig {
    ProviderConfig {
        kind: ProviderKind::Groq,
        api_key: "gsk_test_key_123456".to_string(),
        base_url,
        model: "llama3-8b-8192".to_string(),
    }
}

fn request() -> CompletionRequest {
    CompletionRequest {
        model: "llama3-8b-8192".to_string(),
        prompt: "Summarize this".to_string(),
        max_tokens: 400,
        temperature: 0.3,
    }
}

fn job() -> JobPayload {
    JobPayload {
        job_id: "job-1".into(),
        conversation: "C1".into(),
        placeholder: PlaceholderHandle::Message {
            channel: "C1".into(),
            ts: "1700000000.000100".into(),
        },
        text: None,
        thread_ts: None,
    }
}

#[tokio::test]
async fn llm_client_posts_chat_completion() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("authorization", "Bearer gsk_test_key_123456")
            .json_body_includes(
                json!({
                    "model": "llama3-8b-8192",
                    "max_tokens": 400,
                    "messages": [{ "role": "user", "content": "Summarize this" }]
                })
                .to_string(),
            );
        then.status(200).json_body(json!({
            "choices": [{ "message": { "role": "assistant", "content": "Summary text" } }]
        }));
    });

    let client = LlmClient::new().unwrap();
    let response = client
        .create_completion(&provider_config(server.base_url()), &request())
        .await
        .unwrap();

    mock.assert();
    assert_eq!(response.first_content(), Some("Summary text"));
}

#[tokio::test]
async fn llm_client_surfaces_http_status_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(401)
            .json_body(json!({ "error": { "message": "Invalid API Key" } }));
    });

    let err = LlmClient::new()
        .unwrap()
        .create_completion(&provider_config(server.base_url()), &request())
        .await
        .unwrap_err();

    match err {
        SlackError::ProviderError(msg) => {
            assert!(msg.contains("401"));
            assert!(msg.contains("Invalid API Key"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn relay_signs_and_posts_job() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/api/summarize/background")
            .header_exists(RELAY_SIGNATURE_HEADER)
            .header_exists(RELAY_TIMESTAMP_HEADER)
            .json_body_includes(json!({ "job_id": "job-1", "conversation": "C1" }).to_string());
        then.status(202).json_body(json!({ "ok": true }));
    });

    let relay = HttpRelay::new(server.url("/api/summarize/background"), "secret".into()).unwrap();
    relay.dispatch(job(), Duration::from_secs(2)).await.unwrap();
    mock.assert_calls(1);
}

#[tokio::test]
async fn relay_reports_rejected_job() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/worker");
        then.status(503);
    });

    let relay = HttpRelay::new(server.url("/worker"), "secret".into()).unwrap();
    let err = relay.dispatch(job(), Duration::from_secs(2)).await.unwrap_err();
    assert_eq!(err.code(), "dispatch_failed");
    assert!(err.to_string().contains("503"));
    mock.assert_calls(1);
}

#[tokio::test]
async fn relay_treats_slow_worker_as_running() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/worker");
        then.status(202).delay(Duration::from_millis(800));
    });

    let relay = HttpRelay::with_timeouts(
        server.url("/worker"),
        "secret".into(),
        Duration::from_millis(500),
        Duration::from_millis(100),
    )
    .unwrap();
    relay.dispatch(job(), Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn relay_bounds_send_by_callers_budget() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/worker");
        then.status(202).delay(Duration::from_secs(3));
    });

    let relay = HttpRelay::new(server.url("/worker"), "secret".into()).unwrap();
    let started = std::time::Instant::now();
    relay.dispatch(job(), Duration::from_millis(1_200)).await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(1_450));
    mock.assert_calls(1);
}

#[tokio::test]
async fn relay_refuses_to_start_a_send_it_cannot_finish() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/worker");
        then.status(202);
    });

    let relay = HttpRelay::new(server.url("/worker"), "secret".into()).unwrap();
    let err = relay
        .dispatch(job(), relay.min_budget() - Duration::from_millis(1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "dispatch_failed");
    assert!(err.to_string().contains("not enough time left"));
    mock.assert_calls(0);
}

#[tokio::test]
async fn relay_reports_unreachable_worker() {
    let relay = HttpRelay::with_timeouts(
        "http://127.0.0.1:9/worker".into(),
        "secret".into(),
        Duration::from_millis(200),
        Duration::from_millis(200),
    )
    .unwrap();
    let err = relay.dispatch(job(), Duration::from_secs(2)).await.unwrap_err();
    assert_eq!(err.code(), "dispatch_failed");
}

#[tokio::test]
async fn slack_client_updates_message() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat.update")
            .header("authorization", "Bearer xoxb-test")
            .json_body_includes(
                json!({ "channel": "C1", "ts": "1700000000.000100", "text": "Summary text" })
                    .to_string(),
            );
        then.status(200).json_body(json!({ "ok": true }));
    });

    let client = SlackClient::with_api_base("xoxb-test".into(), server.base_url());
    client
        .update_message("C1", "1700000000.000100", "Summary text")
        .await
        .unwrap();
    mock.assert_calls(1);
}

#[tokio::test]
async fn slack_client_retries_failed_update() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat.update");
        then.status(200)
            .json_body(json!({ "ok": false, "error": "message_not_found" }));
    });

    let client = SlackClient::with_api_base("xoxb-test".into(), server.base_url());
    let err = client
        .update_message("C1", "1700000000.000100", "Summary text")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("message_not_found"));
    mock.assert_calls(4);
}

#[tokio::test]
async fn slack_client_posts_to_response_url() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/commands/T1/1")
            .json_body_includes(json!({ "replace_original": true, "text": "done" }).to_string());
        then.status(200).body("ok");
    });

    let client = SlackClient::new("xoxb-test".into());
    client
        .respond(
            &server.url("/commands/T1/1"),
            &json!({ "replace_original": true, "response_type": "in_channel", "text": "done" }),
        )
        .await
        .unwrap();
    mock.assert_calls(1);
}
