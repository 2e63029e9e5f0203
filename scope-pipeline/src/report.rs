use scope_common::ScopeError;
use scope_llm::Briefing;
use scope_web::UnusableSource;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Where a run currently is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Queried,
    Searching,
    Fetching,
    ContextBuilt,
    Synthesizing,
    Parsed,
    Done,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Queried => "queried",
            Stage::Searching => "searching",
            Stage::Fetching => "fetching",
            Stage::ContextBuilt => "context-built",
            Stage::Synthesizing => "synthesizing",
            Stage::Parsed => "parsed",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal error, annotated with the stage the run reached.
#[derive(Debug, thiserror::Error)]
#[error("run failed during {stage}: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: ScopeError,
}

impl PipelineError {
    pub fn at(stage: Stage, source: ScopeError) -> Self {
        Self { stage, source }
    }
}

/// Everything a completed run hands back to the caller.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub query: String,
    pub briefing: Briefing,
    /// Short provider-written research summary, when one was returned.
    pub search_summary: Option<String>,
    /// Sources that contributed nothing, with the reason each was dropped.
    pub unusable: Vec<UnusableSource>,
    pub stage: Stage,
    pub duration: Duration,
}
