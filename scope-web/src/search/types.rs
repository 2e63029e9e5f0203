//! Wire types for the search provider.
//!
//! The provider is a chat-completions endpoint with web search enabled; we
//! request a strict JSON-schema response carrying a short summary plus a
//! `sources` array. The provider also returns its own raw `search_results`
//! list, which we keep as a fallback when the structured array comes back
//! empty.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Serialize)]
pub struct SearchApiRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub search_mode: &'static str,
    pub search_recency_filter: &'static str,
    pub temperature: f32,
    pub max_tokens: u32,
    pub web_search_options: WebSearchOptions,
    pub response_format: Value,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct WebSearchOptions {
    pub search_context_size: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct SearchApiResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub search_results: Vec<RawSearchResult>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: MessageContent,
}

#[derive(Debug, Deserialize)]
pub struct MessageContent {
    pub content: String,
}

/// Provider-side raw hit, used when the structured sources array is empty.
#[derive(Debug, Deserialize)]
pub struct RawSearchResult {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
}

/// One structured source from the JSON-schema response body.
#[derive(Debug, Deserialize)]
pub struct SourceHit {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(default)]
    pub snippet: Option<String>,
}

/// Payload parsed out of `choices[0].message.content`.
#[derive(Debug, Deserialize)]
pub struct ResearchPayload {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceHit>,
}

/// JSON schema for the structured response we ask the provider to emit.
pub fn response_schema() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "web_research_results",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "summary": { "type": "string" },
                    "sources": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "title": { "type": "string" },
                                "url": { "type": "string" },
                                "snippet": { "type": "string" }
                            },
                            "required": ["url"]
                        }
                    }
                },
                "required": ["sources"]
            }
        }
    })
}
