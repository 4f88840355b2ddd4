//! Integration tests for `CompletionClient` over `HttpTransport`, plus the
//! concurrency bound checked with an instrumented transport.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pricepulse_discovery::{
    CompletionClient, CompletionOptions, CompletionRequest, CompletionTransport, ConcurrencyGate,
    DiscoveryError, HttpTransport, RetryPolicy,
};

/// Client against the mock server with zero back-off so retries are instant.
fn test_client(server: &MockServer, max_retries: u32) -> CompletionClient {
    let transport = HttpTransport::new(
        &format!("{}/v1/chat/completions", server.uri()),
        Some("sk-test".to_owned()),
        5,
    )
    .expect("failed to build test HttpTransport");
    CompletionClient::with_retry(
        Arc::new(transport),
        "gpt-4o-mini",
        ConcurrencyGate::new(5),
        RetryPolicy {
            max_retries,
            backoff_base_ms: 0,
        },
    )
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}]
    })
}

// ---------------------------------------------------------------------------
// Test 1 – request shape and bearer auth
// ---------------------------------------------------------------------------

#[tokio::test]
async fn complete_posts_chat_request_with_bearer_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 4000,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": "You are a precise data extractor that returns only valid JSON."},
                {"role": "user", "content": "extract please"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let body = test_client(&server, 0)
        .complete("extract please", &CompletionOptions::product_extraction())
        .await
        .expect("completion should succeed");

    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["choices"][0]["message"]["content"], "{}");
}

// ---------------------------------------------------------------------------
// Test 2 – 429 is retried, then surfaces as RateLimited
// ---------------------------------------------------------------------------

#[tokio::test]
async fn complete_retries_rate_limit_then_reports_it() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let result = test_client(&server, 2)
        .complete("hi", &CompletionOptions::raw())
        .await;

    assert!(
        matches!(result, Err(DiscoveryError::RateLimited)),
        "expected RateLimited, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Test 3 – transient 5xx recovers on retry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn complete_recovers_after_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_client(&server, 3)
        .complete("hi", &CompletionOptions::raw())
        .await;

    assert!(result.is_ok(), "expected Ok after retry, got: {result:?}");
}

// ---------------------------------------------------------------------------
// Test 4 – client errors are retried like any other non-success status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn complete_retries_bad_request_then_reports_it() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad model"))
        .expect(4)
        .mount(&server)
        .await;

    let result = test_client(&server, 3)
        .complete("hi", &CompletionOptions::raw())
        .await;

    match result {
        Err(DiscoveryError::Api { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body, "bad model");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn complete_retries_not_found_then_recovers() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"choices":[]}"#))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_client(&server, 3)
        .complete("hi", &CompletionOptions::raw())
        .await;

    assert!(result.is_ok(), "expected Ok after 404 retries, got: {result:?}");
}

// ---------------------------------------------------------------------------
// Test 5 – unreachable endpoint reports a transport failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn complete_reports_transport_failure_when_unreachable() {
    let transport =
        HttpTransport::new("http://127.0.0.1:1/v1/chat/completions", Some("k".to_owned()), 5)
            .unwrap();
    let client = CompletionClient::with_retry(
        Arc::new(transport),
        "m",
        ConcurrencyGate::new(5),
        RetryPolicy {
            max_retries: 1,
            backoff_base_ms: 0,
        },
    );

    let result = client.complete("hi", &CompletionOptions::raw()).await;

    assert!(
        matches!(result, Err(DiscoveryError::Transport(_))),
        "expected Transport, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Test 6 – never more than the gate capacity in flight
// ---------------------------------------------------------------------------

#[derive(Default)]
struct InFlightCounter {
    current: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
}

#[async_trait]
impl CompletionTransport for InFlightCounter {
    async fn post(&self, _request: &CompletionRequest) -> Result<String, DiscoveryError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        Ok(completion_body("{}").to_string())
    }
}

#[tokio::test]
async fn concurrent_calls_never_exceed_gate_capacity() {
    let counter = Arc::new(InFlightCounter::default());
    let client = CompletionClient::new(counter.clone(), "m", ConcurrencyGate::new(5));
    let options = CompletionOptions::raw();

    let calls = (0..20).map(|i| {
        let client = &client;
        let options = &options;
        async move { client.complete(&format!("prompt {i}"), options).await }
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(counter.total.load(Ordering::SeqCst), 20);
    let peak = counter.peak.load(Ordering::SeqCst);
    assert!(peak <= 5, "peak in-flight calls was {peak}");
    assert!(peak > 1, "calls should overlap, peak was {peak}");
}
