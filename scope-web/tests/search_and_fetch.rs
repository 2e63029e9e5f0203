use scope_common::{RetryPolicy, ScopeError};
use scope_web::{PageFetcher, SearchClient, SearchQuery, SearchResult};
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
    }
}

fn client(server: &MockServer, max_results: usize) -> SearchClient {
    SearchClient::new(
        &server.uri(),
        "pplx-test".into(),
        "sonar-pro".into(),
        policy(),
        max_results,
        Duration::from_secs(5),
    )
    .unwrap()
}

fn provider_body(sources: serde_json::Value) -> serde_json::Value {
    json!({
        "choices": [{"message": {
            "role": "assistant",
            "content": json!({"summary": "short overview", "sources": sources}).to_string()
        }}]
    })
}

#[tokio::test]
async fn search_parses_ranked_results_and_summary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer pplx-test"))
        .and(body_partial_json(json!({
            "model": "sonar-pro",
            "search_mode": "web",
            "search_recency_filter": "week"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_body(json!([
            {"title": "First", "url": "https://a.example/one", "snippet": "s1"},
            {"url": "not a url"},
            {"title": "Second", "url": "https://b.example/two"}
        ]))))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = client(&server, 8)
        .search(&SearchQuery::new("ci caching"))
        .await
        .unwrap();

    assert_eq!(outcome.summary.as_deref(), Some("short overview"));
    // The malformed url is skipped; ranks stay 1-based and contiguous.
    assert_eq!(outcome.results.len(), 2);
    assert_eq!(outcome.results[0].rank, 1);
    assert_eq!(outcome.results[0].title, "First");
    assert_eq!(outcome.results[1].rank, 2);
    assert_eq!(outcome.results[1].url.as_str(), "https://b.example/two");
}

#[tokio::test]
async fn search_caps_results_at_the_configured_maximum() {
    let server = MockServer::start().await;
    let many: Vec<serde_json::Value> = (0..10)
        .map(|i| json!({"title": format!("T{i}"), "url": format!("https://h{i}.example/")}))
        .collect();
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_body(json!(many))))
        .mount(&server)
        .await;

    let outcome = client(&server, 3)
        .search(&SearchQuery::new("anything"))
        .await
        .unwrap();
    assert_eq!(outcome.results.len(), 3);
}

#[tokio::test]
async fn empty_result_set_is_valid_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(provider_body(json!([]))))
        .mount(&server)
        .await;

    let outcome = client(&server, 8)
        .search(&SearchQuery::new("nothing"))
        .await
        .unwrap();
    assert!(outcome.results.is_empty());
}

#[tokio::test]
async fn transient_provider_failures_exhaust_exactly_the_attempt_budget() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let err = client(&server, 8)
        .search(&SearchQuery::new("flaky"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScopeError::Retrieval(_)));
}

#[tokio::test]
async fn auth_failures_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "invalid token"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 8)
        .search(&SearchQuery::new("denied"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("invalid token"));
}

#[tokio::test]
async fn fetcher_records_failure_and_falls_back_to_snippet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<html><body><script>let x = 1;</script></body></html>"),
        )
        .mount(&server)
        .await;

    let fetcher = PageFetcher::new(2000).unwrap();
    let timeout = Duration::from_secs(5);

    let missing = SearchResult {
        url: Url::parse(&format!("{}/missing", server.uri())).unwrap(),
        title: "Missing".into(),
        snippet: "gone".into(),
        rank: 1,
    };
    let page = fetcher.fetch(&missing, timeout).await;
    assert!(!page.is_ok());
    assert!(page.failure_reason().is_some());

    let empty = SearchResult {
        url: Url::parse(&format!("{}/empty", server.uri())).unwrap(),
        title: "Empty".into(),
        snippet: "useful snippet text".into(),
        rank: 2,
    };
    let page = fetcher.fetch(&empty, timeout).await;
    assert!(page.is_ok());
    assert_eq!(page.text, "useful snippet text");
}
