//! Client for the web search provider.
//!
//! Retries route through the shared [`RetryPolicy`]; the inner HTTP client
//! never retries on its own so exactly `max_attempts` provider calls can be
//! observed from outside.

use crate::types::{SearchQuery, SearchResult};
use scope_common::{Intent, RetryPolicy, ScopeError};
use scope_http::{Auth, HttpClient, HttpError, RequestOpts};
use std::time::Duration;
use url::Url;

use super::types::{
    response_schema, ChatMessage, ResearchPayload, SearchApiRequest, SearchApiResponse,
    WebSearchOptions,
};

const SEARCH_SYSTEM_PROMPT: &str = "You are a dev tooling research assistant. Use web search to \
find high-quality, recent sources about developer tools, platforms, and AI assistants related to \
the user's question. Return a JSON object with a short 'summary' and a 'sources' array. Each \
source must include the URL and, if possible, a short snippet. Do NOT add commentary outside the \
JSON.";

/// Ranked sources plus the provider's one-line research summary.
#[derive(Debug)]
pub struct SearchOutcome {
    pub summary: Option<String>,
    pub results: Vec<SearchResult>,
}

pub struct SearchClient {
    http: HttpClient,
    api_key: String,
    model: String,
    policy: RetryPolicy,
    max_results: usize,
}

impl SearchClient {
    pub fn new(
        endpoint: &str,
        api_key: String,
        model: String,
        policy: RetryPolicy,
        max_results: usize,
        timeout: Duration,
    ) -> scope_common::Result<Self> {
        let http = HttpClient::new(endpoint)
            .map_err(|e| ScopeError::Config(format!("search endpoint invalid: {e}")))?
            .with_timeout(timeout);
        Ok(Self {
            http,
            api_key,
            model,
            policy,
            max_results,
        })
    }

    /// Issue one search. Provider order is preserved and capped at
    /// `max_results`; an empty result list is valid output. Fails with
    /// [`ScopeError::Retrieval`] once the retry budget is spent.
    pub async fn search(&self, query: &SearchQuery) -> scope_common::Result<SearchOutcome> {
        let req = self.build_request(query);

        let resp: SearchApiResponse = self
            .policy
            .run(
                "search",
                || async {
                    self.http
                        .post_json(
                            "chat/completions",
                            &req,
                            RequestOpts {
                                auth: Some(Auth::Bearer(&self.api_key)),
                                retries: Some(0),
                                ..Default::default()
                            },
                        )
                        .await
                },
                HttpError::is_transient,
            )
            .await
            .map_err(|e| ScopeError::Retrieval(e.to_string()))?;

        Ok(self.collect_results(resp))
    }

    fn build_request(&self, query: &SearchQuery) -> SearchApiRequest {
        SearchApiRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SEARCH_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: shape_query(query),
                },
            ],
            search_mode: query.mode.as_str(),
            search_recency_filter: query.recency.as_str(),
            temperature: 0.0,
            max_tokens: 1024,
            web_search_options: WebSearchOptions {
                search_context_size: "high",
            },
            response_format: response_schema(),
        }
    }

    fn collect_results(&self, resp: SearchApiResponse) -> SearchOutcome {
        let payload = resp
            .choices
            .first()
            .and_then(|c| parse_payload(&c.message.content));

        let (summary, hits): (Option<String>, Vec<(Option<String>, String, Option<String>)>) =
            match payload {
                Some(p) if !p.sources.is_empty() => (
                    p.summary,
                    p.sources
                        .into_iter()
                        .map(|s| (s.title, s.url, s.snippet))
                        .collect(),
                ),
                other => {
                    // Fallback: the provider's own raw hit list.
                    let summary = other.and_then(|p| p.summary);
                    (
                        summary,
                        resp.search_results
                            .into_iter()
                            .map(|r| (r.title, r.url, None))
                            .collect(),
                    )
                }
            };

        let mut results = Vec::new();
        for (title, url, snippet) in hits {
            if results.len() >= self.max_results {
                break;
            }
            let Ok(url) = Url::parse(&url) else {
                tracing::debug!(target: "web.search", url = %url, "search.skip_unparseable_url");
                continue;
            };
            let rank = results.len() + 1;
            results.push(SearchResult {
                title: title.unwrap_or_else(|| format!("Source {rank}")),
                snippet: snippet.unwrap_or_default(),
                url,
                rank,
            });
        }

        tracing::info!(
            target: "web.search",
            hit_count = results.len(),
            has_summary = summary.is_some(),
            "search.results"
        );
        SearchOutcome { summary, results }
    }
}

/// Shape the provider query from the question, intent, focus area, and
/// stack hint.
fn shape_query(query: &SearchQuery) -> String {
    let text = query.text.trim();
    let mut q = match query.intent {
        Intent::Discover => format!("Developer productivity tools to help with: {text}"),
        Intent::Compare => format!("Compare popular developer tools in this category: {text}"),
        Intent::DeepDive => {
            format!("Deep dive on developer tool: {text} (use cases, pros/cons, ecosystem)")
        }
    };
    if let Some(hint) = query.focus.prompt_hint() {
        q.push_str(&format!(" (focus on {hint})"));
    }
    if let Some(stack) = query.stack_hint() {
        q.push_str(&format!(" for a stack that includes: {stack}"));
    }
    q
}

fn parse_payload(content: &str) -> Option<ResearchPayload> {
    match serde_json::from_str::<ResearchPayload>(content) {
        Ok(p) => Some(p),
        Err(e) => {
            tracing::warn!(
                target: "web.search",
                error = %e,
                snippet = %content.chars().take(200).collect::<String>(),
                "search.payload_parse_failed"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scope_common::FocusArea;

    #[test]
    fn shaped_query_carries_focus_and_stack() {
        let mut q = SearchQuery::new("feature flag tools");
        q.focus = FocusArea::Backend;
        q.stack = Some("Rust, Postgres".into());
        let shaped = shape_query(&q);
        assert!(shaped.starts_with("Developer productivity tools to help with: feature flag tools"));
        assert!(shaped.contains("backend services and APIs"));
        assert!(shaped.ends_with("for a stack that includes: Rust, Postgres"));
    }

    #[test]
    fn each_intent_phrases_the_query_differently() {
        let mut q = SearchQuery::new("feature flags");
        q.intent = Intent::Compare;
        assert!(shape_query(&q).starts_with("Compare popular developer tools"));
        q.intent = Intent::DeepDive;
        let shaped = shape_query(&q);
        assert!(shaped.starts_with("Deep dive on developer tool: feature flags"));
        assert!(shaped.contains("pros/cons"));
    }

    #[test]
    fn payload_parse_tolerates_garbage() {
        assert!(parse_payload("not json at all").is_none());
        let p = parse_payload(r#"{"summary":"s","sources":[{"url":"https://a.example/x"}]}"#)
            .unwrap();
        assert_eq!(p.sources.len(), 1);
        assert_eq!(p.summary.as_deref(), Some("s"));
    }
}
