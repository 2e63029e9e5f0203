mod common;

use scope_common::{RetryPolicy, ScopeError};
use scope_llm::{BriefingSynthesizer, LlmClient, OpenAiClient};
use scope_web::{ContextChunk, SearchQuery};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_body(text: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 100, "completion_tokens": 50, "total_tokens": 150}
    })
}

fn chunks() -> Vec<ContextChunk> {
    vec![ContextChunk {
        url: Url::parse("https://docs.example/flags").unwrap(),
        text: "Feature flags let teams ship dark.".into(),
        truncated: false,
    }]
}

async fn client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(
        &server.uri(),
        "test-key".into(),
        "gpt-4o-mini".into(),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn synthesize_sends_tagged_context_and_returns_completion() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(
            "## Summary\nUse flags.\n## Confidence\nhigh",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let synth = BriefingSynthesizer::new(
        Arc::new(client(&server).await),
        RetryPolicy::default(),
        Duration::from_secs(5),
    );
    let raw = synth
        .synthesize(&SearchQuery::new("feature flags"), &chunks())
        .await
        .unwrap();
    assert!(raw.contains("Use flags."));

    // The outbound request embeds the [S1]-tagged chunk so the model can
    // cite it.
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let user_msg = body["messages"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["role"] == "user")
        .unwrap();
    let content = user_msg["content"].as_str().unwrap();
    assert!(content.contains("[S1] URL: https://docs.example/flags"));
    assert!(content.contains("Feature flags let teams ship dark."));
}

#[tokio::test]
async fn rate_limit_is_retried_then_recovers() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "rate limited", "type": "rate_limit_error"}
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body("## Summary\nrecovered")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let synth = BriefingSynthesizer::new(
        Arc::new(client(&server).await),
        RetryPolicy::default(),
        Duration::from_secs(5),
    );
    let raw = synth
        .synthesize(&SearchQuery::new("feature flags"), &chunks())
        .await
        .unwrap();
    assert!(raw.contains("recovered"));
}

#[tokio::test]
async fn auth_failure_is_not_retried() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "invalid api key", "type": "auth_error"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let synth = BriefingSynthesizer::new(
        Arc::new(client(&server).await),
        RetryPolicy::default(),
        Duration::from_secs(5),
    );
    let err = synth
        .synthesize(&SearchQuery::new("feature flags"), &chunks())
        .await
        .unwrap_err();
    assert!(matches!(err, ScopeError::Synthesis(_)));
    assert!(err.to_string().contains("invalid api key"));
}

#[tokio::test]
async fn ollama_generate_round_trip() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2:3b",
            "response": "## Summary\nlocal answer",
            "done": true,
            "eval_count": 42
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = scope_llm::OllamaClient::new(
        &server.uri(),
        "llama3.2:3b".into(),
        Duration::from_secs(5),
    )
    .unwrap();
    let resp = client
        .generate("prompt", Some("system"), Some(64), Some(0.2))
        .await
        .unwrap();
    assert_eq!(resp.text, "## Summary\nlocal answer");
    assert_eq!(resp.tokens_used, Some(42));
}
