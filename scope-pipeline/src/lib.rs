//! End-to-end orchestration of one briefing run.
//!
//! The run walks a fixed state machine: queried → searching → fetching →
//! context-built → synthesizing → parsed → done. Per-page fetch failures
//! shrink the context but never fail the run; an empty search result set,
//! an empty context, or synthesis retry exhaustion stop it at the stage
//! that observed the problem.

pub mod report;

pub use report::{PipelineError, RunReport, Stage};

use scope_common::{RetryPolicy, ScopeError};
use scope_config::{LlmProviderConfig, PipelineConfig, ScopeConfig};
use scope_llm::{BriefingSynthesizer, LlmClient, OllamaClient, OpenAiClient, briefing};
use scope_web::{FetchedPage, PageFetcher, SearchClient, SearchQuery, SearchResult, context};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{Instrument, info, warn};
use uuid::Uuid;

struct RunOptions {
    budget_chars: usize,
    fetch_timeout: Duration,
    run_timeout: Duration,
    max_concurrency: usize,
    defaults: PipelineConfig,
}

pub struct Pipeline {
    search: SearchClient,
    fetcher: Arc<PageFetcher>,
    synthesizer: BriefingSynthesizer,
    options: RunOptions,
}

impl Pipeline {
    /// Wire up all components from validated configuration. Fails with
    /// [`ScopeError::Config`] before any network call when the configuration
    /// is unusable.
    pub fn from_config(config: &ScopeConfig) -> scope_common::Result<Self> {
        config.validate()?;
        let p = &config.pipeline;

        let policy = RetryPolicy {
            max_attempts: p.max_retries,
            base_delay: p.retry_base(),
        };

        let search = SearchClient::new(
            &config.search.endpoint,
            config.search.api_key.clone(),
            config.search.model.clone(),
            policy,
            p.max_results,
            p.synth_timeout(),
        )?;

        let fetcher = Arc::new(PageFetcher::new(p.page_char_cap)?);

        let (llm, temperature, max_tokens): (Arc<dyn LlmClient>, Option<f32>, Option<u32>) =
            match &config.llm {
                LlmProviderConfig::Openai {
                    model,
                    api_key,
                    endpoint,
                    temperature,
                    max_tokens,
                } => {
                    let client = OpenAiClient::new(
                        endpoint,
                        api_key.clone(),
                        model.clone(),
                        p.synth_timeout(),
                    )
                    .map_err(|e| ScopeError::Config(format!("llm client init failed: {e}")))?;
                    (Arc::new(client), *temperature, *max_tokens)
                }
                LlmProviderConfig::Ollama {
                    model,
                    endpoint,
                    temperature,
                    max_tokens,
                } => {
                    let client = OllamaClient::new(endpoint, model.clone(), p.synth_timeout())
                        .map_err(|e| ScopeError::Config(format!("llm client init failed: {e}")))?;
                    (Arc::new(client), *temperature, *max_tokens)
                }
            };

        let synthesizer = BriefingSynthesizer::new(llm, policy, p.synth_timeout())
            .with_sampling(temperature, max_tokens);

        Ok(Self {
            search,
            fetcher,
            synthesizer,
            options: RunOptions {
                budget_chars: p.budget_chars,
                fetch_timeout: p.fetch_timeout(),
                run_timeout: p.run_timeout(),
                max_concurrency: p.max_concurrency,
                defaults: p.clone(),
            },
        })
    }

    /// Execute one full run for a free-text question.
    pub async fn run(&self, text: &str, stack: Option<String>) -> Result<RunReport, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(target: "pipeline", "run", %run_id);
        self.run_inner(run_id, text, stack).instrument(span).await
    }

    async fn run_inner(
        &self,
        run_id: Uuid,
        text: &str,
        stack: Option<String>,
    ) -> Result<RunReport, PipelineError> {
        let started = Instant::now();
        let deadline = started + self.options.run_timeout;
        let query = self.build_query(text, stack);
        info!(target: "pipeline", stage = %Stage::Queried, query = %query.text, "run started");

        let outcome = self
            .search
            .search(&query)
            .await
            .map_err(|e| PipelineError::at(Stage::Searching, e))?;
        if outcome.results.is_empty() {
            return Err(PipelineError::at(
                Stage::Searching,
                ScopeError::Retrieval("search returned no results".into()),
            ));
        }
        info!(
            target: "pipeline",
            stage = %Stage::Searching,
            results = outcome.results.len(),
            "search complete"
        );

        let pages = self.fetch_all(&outcome.results, deadline).await;
        let ok = pages.iter().filter(|p| p.is_ok()).count();
        info!(
            target: "pipeline",
            stage = %Stage::Fetching,
            ok,
            failed = pages.len() - ok,
            "fetch phase complete"
        );

        let context = context::assemble(&pages, self.options.budget_chars);
        if context.chunks.is_empty() {
            return Err(PipelineError::at(Stage::ContextBuilt, ScopeError::EmptyContext));
        }
        info!(
            target: "pipeline",
            stage = %Stage::ContextBuilt,
            chunks = context.chunks.len(),
            chars = context.total_chars(),
            unusable = context.unusable.len(),
            "context assembled"
        );

        let raw = self
            .synthesizer
            .synthesize(&query, &context.chunks)
            .await
            .map_err(|e| PipelineError::at(Stage::Synthesizing, e))?;

        let briefing = briefing::parse(&raw, context.source_urls());
        info!(
            target: "pipeline",
            stage = %Stage::Parsed,
            sources = briefing.sources.len(),
            confidence = briefing.confidence.as_str(),
            "briefing parsed"
        );

        Ok(RunReport {
            run_id,
            query: query.text,
            briefing,
            search_summary: outcome.summary,
            unusable: context.unusable,
            stage: Stage::Done,
            duration: started.elapsed(),
        })
    }

    fn build_query(&self, text: &str, stack: Option<String>) -> SearchQuery {
        let d = &self.options.defaults;
        SearchQuery {
            text: text.to_string(),
            intent: d.intent,
            mode: d.mode,
            recency: d.recency,
            focus: d.focus,
            depth: d.depth,
            stack,
        }
    }

    /// Fetch every result concurrently under the semaphore cap. Slots are
    /// pre-assigned by rank so the output order is deterministic regardless
    /// of completion order. When the run deadline expires, unfinished
    /// fetches are abandoned and recorded as failed.
    async fn fetch_all(&self, results: &[SearchResult], deadline: Instant) -> Vec<FetchedPage> {
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrency));
        let mut tasks = JoinSet::new();

        for (slot, result) in results.iter().enumerate() {
            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(&semaphore);
            let result = result.clone();
            let timeout = self.options.fetch_timeout;
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            slot,
                            FetchedPage::failed(result.url.clone(), result.rank, "fetch cancelled"),
                        );
                    }
                };
                (slot, fetcher.fetch(&result, timeout).await)
            });
        }

        let mut slots: Vec<Option<FetchedPage>> = (0..results.len()).map(|_| None).collect();
        while !tasks.is_empty() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, tasks.join_next()).await {
                Ok(Some(Ok((slot, page)))) => slots[slot] = Some(page),
                Ok(Some(Err(join_err))) => {
                    warn!(target: "pipeline", error = %join_err, "fetch task aborted");
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(
                        target: "pipeline",
                        unfinished = tasks.len(),
                        "run deadline reached; abandoning unfinished fetches"
                    );
                    tasks.abort_all();
                    break;
                }
            }
        }

        slots
            .into_iter()
            .zip(results)
            .map(|(slot, result)| {
                slot.unwrap_or_else(|| {
                    FetchedPage::failed(
                        result.url.clone(),
                        result.rank,
                        "abandoned after run deadline",
                    )
                })
            })
            .collect()
    }
}
