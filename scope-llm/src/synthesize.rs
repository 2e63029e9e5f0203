//! Turns a query plus attributed context into a raw briefing completion.

use crate::traits::{LlmClient, LlmError};
use scope_common::{Depth, Result, RetryPolicy, ScopeError};
use scope_web::{ContextChunk, SearchQuery};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const BLOCK_SEPARATOR: &str = "------------------------";

const DEFAULT_TEMPERATURE: f32 = 0.15;
const DEFAULT_MAX_TOKENS: u32 = 1400;

/// Builds the synthesis prompt and issues the completion call with retry.
pub struct BriefingSynthesizer {
    llm: Arc<dyn LlmClient>,
    policy: RetryPolicy,
    timeout: Duration,
    temperature: f32,
    max_tokens: u32,
}

impl BriefingSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>, policy: RetryPolicy, timeout: Duration) -> Self {
        Self {
            llm,
            policy,
            timeout,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        if let Some(t) = temperature {
            self.temperature = t;
        }
        if let Some(m) = max_tokens {
            self.max_tokens = m;
        }
        self
    }

    /// Produce the raw completion text for the given query and context.
    ///
    /// Refuses to run with zero chunks: an ungrounded completion is worse
    /// than a failed run. Transient provider errors are retried through the
    /// shared policy; exhaustion surfaces as [`ScopeError::Synthesis`].
    pub async fn synthesize(&self, query: &SearchQuery, chunks: &[ContextChunk]) -> Result<String> {
        if chunks.is_empty() {
            return Err(ScopeError::EmptyContext);
        }

        let system = build_system_prompt(query);
        let user = build_user_message(query, chunks);

        let response = self
            .policy
            .run(
                "synthesis",
                || async {
                    match tokio::time::timeout(
                        self.timeout,
                        self.llm.generate(
                            &user,
                            Some(&system),
                            Some(self.max_tokens),
                            Some(self.temperature),
                        ),
                    )
                    .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(LlmError::Timeout),
                    }
                },
                LlmError::is_transient,
            )
            .await
            .map_err(|e| ScopeError::Synthesis(e.to_string()))?;

        info!(
            target: "llm.synthesize",
            model = self.llm.model_name(),
            chunks = chunks.len(),
            chars = response.text.len(),
            tokens = response.tokens_used,
            "completion received"
        );

        Ok(response.text)
    }
}

fn build_system_prompt(query: &SearchQuery) -> String {
    let depth_text = match query.depth {
        Depth::Quick => "Keep the briefing concise, focusing on the most impactful tools.",
        Depth::Standard => "Provide a balanced, actionable briefing.",
        Depth::Deep => {
            "Provide a deep, structured briefing with nuanced analysis and adoption tips."
        }
    };

    let mut prompt = String::from(
        "You are a senior engineer and developer-productivity researcher. \
         You answer based ONLY on the provided web context, labeled as [S1], [S2], etc. \
         If something is not supported by the context, say that it is not clearly covered. ",
    );
    prompt.push_str(depth_text);
    if let Some(hint) = query.focus.prompt_hint() {
        prompt.push(' ');
        prompt.push_str(&format!(
            "Prioritize tools and practices related to {hint} when they appear in the context."
        ));
    }
    prompt.push_str(
        "\nStructure your answer with the following sections:\n\
         1. Summary\n\
         2. Recommended tools & platforms\n\
         3. Adoption steps\n\
         4. Trade-offs & caveats\n\
         5. Confidence\n\
         6. Limitations\n\n\
         When you mention a specific tool, cite supporting sources in brackets like [S1], [S2].",
    );
    prompt
}

fn build_user_message(query: &SearchQuery, chunks: &[ContextChunk]) -> String {
    let blocks: Vec<String> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[S{}] URL: {}\n\n{}\n{BLOCK_SEPARATOR}",
                i + 1,
                chunk.url,
                chunk.text
            )
        })
        .collect();

    let mut message = format!(
        "User question:\n{}\n\nWeb research context:\n{}",
        query.text,
        blocks.join("\n\n")
    );

    if let Some(stack) = query.stack_hint() {
        message.push_str(&format!(
            "\n\nThe user also described their tech stack as:\n{stack}\n\
             Tailor recommendations and caveats to this stack where relevant."
        ));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::LlmResponse;
    use async_trait::async_trait;
    use scope_common::{FocusArea, Intent, Recency, SearchMode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use url::Url;

    fn chunk(url: &str, text: &str) -> ContextChunk {
        ContextChunk {
            url: Url::parse(url).unwrap(),
            text: text.to_string(),
            truncated: false,
        }
    }

    fn query() -> SearchQuery {
        SearchQuery {
            text: "best feature flag tools".into(),
            intent: Intent::Discover,
            mode: SearchMode::Web,
            recency: Recency::Week,
            focus: FocusArea::Backend,
            depth: Depth::Standard,
            stack: Some("Rust, Postgres".into()),
        }
    }

    struct FlakyLlm {
        calls: AtomicUsize,
        fail_first: usize,
    }

    #[async_trait]
    impl LlmClient for FlakyLlm {
        async fn generate(
            &self,
            _prompt: &str,
            _system_prompt: Option<&str>,
            _max_tokens: Option<u32>,
            _temperature: Option<f32>,
        ) -> std::result::Result<LlmResponse, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.fail_first {
                Err(LlmError::RateLimit)
            } else {
                Ok(LlmResponse {
                    text: "## Summary\nok".into(),
                    model: Some("mock".into()),
                    tokens_used: None,
                })
            }
        }

        fn model_name(&self) -> &str {
            "mock"
        }
    }

    #[test]
    fn prompt_embeds_tagged_chunks_and_stack() {
        let chunks = vec![
            chunk("https://a.example/x", "alpha text"),
            chunk("https://b.example/y", "beta text"),
        ];
        let user = build_user_message(&query(), &chunks);
        assert!(user.contains("[S1] URL: https://a.example/x"));
        assert!(user.contains("[S2] URL: https://b.example/y"));
        assert!(user.contains("alpha text"));
        assert!(user.contains("tech stack as:\nRust, Postgres"));

        let system = build_system_prompt(&query());
        assert!(system.contains("6. Limitations"));
        assert!(system.contains("backend"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let chunks = vec![chunk("https://a.example/", "same")];
        assert_eq!(
            build_user_message(&query(), &chunks),
            build_user_message(&query(), &chunks)
        );
    }

    #[tokio::test]
    async fn refuses_empty_context() {
        let llm = Arc::new(FlakyLlm {
            calls: AtomicUsize::new(0),
            fail_first: 0,
        });
        let synth =
            BriefingSynthesizer::new(llm.clone(), RetryPolicy::default(), Duration::from_secs(5));
        let err = synth.synthesize(&query(), &[]).await.unwrap_err();
        assert!(matches!(err, ScopeError::EmptyContext));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures_then_succeeds() {
        let llm = Arc::new(FlakyLlm {
            calls: AtomicUsize::new(0),
            fail_first: 2,
        });
        let synth =
            BriefingSynthesizer::new(llm.clone(), RetryPolicy::default(), Duration::from_secs(5));
        let text = synth
            .synthesize(&query(), &[chunk("https://a.example/", "ctx")])
            .await
            .unwrap();
        assert!(text.contains("Summary"));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_surfaces_as_synthesis_error() {
        let llm = Arc::new(FlakyLlm {
            calls: AtomicUsize::new(0),
            fail_first: usize::MAX,
        });
        let synth =
            BriefingSynthesizer::new(llm.clone(), RetryPolicy::default(), Duration::from_secs(5));
        let err = synth
            .synthesize(&query(), &[chunk("https://a.example/", "ctx")])
            .await
            .unwrap_err();
        assert!(matches!(err, ScopeError::Synthesis(_)));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
    }
}
