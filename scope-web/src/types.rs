//! Entities flowing through the retrieval half of the pipeline.
//!
//! Each of these is created at one stage and never mutated afterwards; the
//! run that created them is their sole owner.

use scope_common::{Depth, FocusArea, Intent, Recency, SearchMode};
use serde::Serialize;
use url::Url;

/// A user question plus its enumerated run options. Immutable once issued.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub intent: Intent,
    pub mode: SearchMode,
    pub recency: Recency,
    pub focus: FocusArea,
    pub depth: Depth,
    /// Optional tech-stack hint, woven into both the search query and the
    /// synthesis prompt.
    pub stack: Option<String>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            intent: Intent::default(),
            mode: SearchMode::default(),
            recency: Recency::default(),
            focus: FocusArea::default(),
            depth: Depth::default(),
            stack: None,
        }
    }

    /// Trimmed stack hint, `None` when blank.
    pub fn stack_hint(&self) -> Option<&str> {
        self.stack.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// One ranked hit from the search provider. Rank is 1-based and preserves
/// the provider's relevance order; we never re-rank.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub url: Url,
    pub title: String,
    pub snippet: String,
    pub rank: usize,
}

/// Outcome of fetching one search result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Ok,
    Failed { reason: String },
}

/// The cleaned text of one page, or the reason it could not be produced.
/// One per [`SearchResult`]; immutable after creation.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: Url,
    pub rank: usize,
    pub text: String,
    pub status: FetchStatus,
}

impl FetchedPage {
    pub fn ok(url: Url, rank: usize, text: String) -> Self {
        Self {
            url,
            rank,
            text,
            status: FetchStatus::Ok,
        }
    }

    pub fn failed(url: Url, rank: usize, reason: impl Into<String>) -> Self {
        Self {
            url,
            rank,
            text: String::new(),
            status: FetchStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == FetchStatus::Ok
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            FetchStatus::Ok => None,
            FetchStatus::Failed { reason } => Some(reason),
        }
    }
}
