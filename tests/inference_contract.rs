//! Contract tests for the inference gateway client.
//!
//! These verify the exact HTTP format the client speaks against the
//! hosted model endpoints: request shape, credential forwarding, both
//! classification response shapes, chat-completion parsing, and error
//! mapping. A wiremock server stands in for the gateway.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use murmur::config::InferenceConfig;
use murmur::error::JournalError;
use murmur::inference::{ChatMessage, InferenceClient};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base_url: String) -> InferenceClient {
    let config = InferenceConfig {
        base_url,
        timeout_secs: 5,
        ..Default::default()
    };
    InferenceClient::new(&config).unwrap()
}

// ────────────────────────────────────────────────────────────────────────
// Text classification
// ────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn classification_sends_credential_and_inputs() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/acme/emotions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"inputs": "I am thrilled"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"label": "joy", "score": 0.9}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(mock_server.uri());
    let result = client
        .text_classification("acme/emotions", "I am thrilled", "test-key")
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].label, "joy");
}

#[tokio::test]
async fn classification_flattens_nested_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/acme/emotions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
            {"label": "joy", "score": 0.9},
            {"label": "fear", "score": 0.1}
        ]])))
        .mount(&mock_server)
        .await;

    let client = client_for(mock_server.uri());
    let result = client
        .text_classification("acme/emotions", "text", "test-key")
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].label, "joy");
    assert_eq!(result[1].label, "fear");
}

#[tokio::test]
async fn classification_error_status_maps_to_inference_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/acme/emotions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model is loading"))
        .mount(&mock_server)
        .await;

    let client = client_for(mock_server.uri());
    let result = client
        .text_classification("acme/emotions", "text", "test-key")
        .await;

    match result {
        Err(JournalError::Inference(message)) => {
            assert!(message.contains("503"), "message was: {message}");
            assert!(message.contains("model is loading"));
        }
        other => panic!("expected inference error, got {other:?}"),
    }
}

#[tokio::test]
async fn classification_malformed_body_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/acme/emotions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"error": "unexpected shape"})),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(mock_server.uri());
    let result = client
        .text_classification("acme/emotions", "text", "test-key")
        .await;

    assert!(matches!(result, Err(JournalError::Inference(_))));
}

#[tokio::test]
async fn classification_timeout_maps_to_inference_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/acme/emotions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"label": "joy", "score": 0.9}]))
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&mock_server)
        .await;

    let config = InferenceConfig {
        base_url: mock_server.uri(),
        timeout_secs: 1,
        ..Default::default()
    };
    let client = InferenceClient::new(&config).unwrap();
    let result = client
        .text_classification("acme/emotions", "text", "test-key")
        .await;

    match result {
        Err(JournalError::Inference(message)) => {
            assert!(message.contains("timed out"), "message was: {message}");
        }
        other => panic!("expected timeout error, got {other:?}"),
    }
}

// ────────────────────────────────────────────────────────────────────────
// Chat completion
// ────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn chat_completion_sends_expected_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/acme/writer/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "acme/writer",
            "max_tokens": 500,
            "messages": [
                {"role": "system", "content": "Be gentle."},
                {"role": "user", "content": "I am thrilled"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Lovely."}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(mock_server.uri());
    let messages = [
        ChatMessage::system("Be gentle."),
        ChatMessage::user("I am thrilled"),
    ];
    let result = client
        .chat_completion("acme/writer", &messages, 500, "test-key")
        .await
        .unwrap();

    assert_eq!(result, "Lovely.");
}

#[tokio::test]
async fn chat_completion_trims_first_choice() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/acme/writer/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [
                {"message": {"content": "  first  \n"}},
                {"message": {"content": "second"}}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(mock_server.uri());
    let messages = [ChatMessage::user("hi")];
    let result = client
        .chat_completion("acme/writer", &messages, 100, "test-key")
        .await
        .unwrap();

    assert_eq!(result, "first");
}

#[tokio::test]
async fn chat_completion_empty_choices_is_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/models/acme/writer/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let client = client_for(mock_server.uri());
    let messages = [ChatMessage::user("hi")];
    let result = client
        .chat_completion("acme/writer", &messages, 100, "test-key")
        .await;

    match result {
        Err(JournalError::Inference(message)) => {
            assert!(message.contains("no choices"), "message was: {message}");
        }
        other => panic!("expected inference error, got {other:?}"),
    }
}
