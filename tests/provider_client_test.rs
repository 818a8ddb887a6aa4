//! Mock HTTP server tests for `ProviderClient::send()`.
//!
//! Each provider variant is exercised against a local wiremock server,
//! with a simulated clock so quota waits cost no real time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mailsummary::error::LlmError;
use mailsummary::llm::{ManualClock, Provider, ProviderClient, SharedUsage, UsageLimits, UsageTracker};

fn simulated_usage(limits: UsageLimits) -> (SharedUsage, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()));
    (UsageTracker::with_clock(limits, clock.clone()).shared(), clock)
}

fn client(provider: Provider, server: &MockServer, route: &str, usage: SharedUsage) -> ProviderClient {
    ProviderClient::with_usage(provider, "test-key", usage)
        .unwrap()
        .with_endpoint(format!("{}{}", server.uri(), route))
}

#[tokio::test]
async fn test_openai_send() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "gpt-3.5-turbo", "max_tokens": 500})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"comprehensive_summary\": \"ok\"}"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (usage, _clock) = simulated_usage(UsageLimits::default());
    let client = client(Provider::OpenAi, &server, "/v1/chat/completions", usage);

    let text = client.send("hello").await.unwrap();
    assert_eq!(text, "{\"comprehensive_summary\": \"ok\"}");
}

#[tokio::test]
async fn test_anthropic_send() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{"type": "text", "text": "summary text"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (usage, _clock) = simulated_usage(UsageLimits::default());
    let client = client(Provider::Anthropic, &server, "/v1/messages", usage);

    assert_eq!(client.send("hello").await.unwrap(), "summary text");
}

#[tokio::test]
async fn test_google_send_and_usage_accounting() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash-lite:generateContent"))
        .and(query_param("key", "test-key"))
        .and(body_partial_json(json!({"generationConfig": {"maxOutputTokens": 500}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "gemini says hi"}]}}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let (usage, clock) = simulated_usage(UsageLimits::default());
    let client = client(
        Provider::Google,
        &server,
        "/v1beta/models/gemini-2.0-flash-lite:generateContent",
        usage,
    );

    let prompt = "x".repeat(400);
    assert_eq!(client.send(&prompt).await.unwrap(), "gemini says hi");
    assert_eq!(client.send(&prompt).await.unwrap(), "gemini says hi");

    // Second send waited for the minimum spacing on the simulated clock
    assert_eq!(clock.sleeps().len(), 1);
    assert!(clock.sleeps()[0] <= Duration::from_secs(4));

    let status = client.usage_status().await;
    assert_eq!(status.requests_today, 2);
    assert_eq!(status.tokens_this_minute, 200);
}

#[tokio::test]
async fn test_non_success_status_is_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("quota exhausted"))
        .expect(1)
        .mount(&server)
        .await;

    let (usage, _clock) = simulated_usage(UsageLimits::default());
    let client = client(Provider::OpenAi, &server, "/v1/chat/completions", usage);

    match client.send("hello").await {
        Err(LlmError::Transport { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "quota exhausted");
        }
        other => panic!("expected Transport error, got {:?}", other.map(|_| ())),
    }

    // Failed sends are not counted
    assert_eq!(client.usage_status().await.requests_today, 0);
}

#[tokio::test]
async fn test_unexpected_envelope_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
        .mount(&server)
        .await;

    let (usage, _clock) = simulated_usage(UsageLimits::default());
    let client = client(Provider::Anthropic, &server, "/v1/messages", usage);

    let err = client.send("hello").await.unwrap_err();
    assert!(matches!(err, LlmError::MalformedEnvelope(_)));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_non_json_body_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let (usage, _clock) = simulated_usage(UsageLimits::default());
    let client = client(Provider::OpenAi, &server, "/v1/chat/completions", usage);

    assert!(matches!(
        client.send("hello").await,
        Err(LlmError::MalformedEnvelope(_))
    ));
}

#[tokio::test]
async fn test_shared_usage_across_clients_hits_daily_cap() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let limits = UsageLimits {
        requests_per_day: 2,
        ..UsageLimits::default()
    };
    let (usage, _clock) = simulated_usage(limits);
    let first = client(Provider::OpenAi, &server, "/v1/chat/completions", usage.clone());
    let second = client(Provider::OpenAi, &server, "/v1/chat/completions", usage);

    first.send("a").await.unwrap();
    second.send("b").await.unwrap();

    let err = first.send("c").await.unwrap_err();
    assert!(matches!(err, LlmError::QuotaExceeded { .. }));
    assert!(!err.is_transport());
}
