//! Common types shared across the toolscope workspace.
//!
//! This crate defines the error taxonomy, the reusable retry policy, and the
//! observability helpers used by every other crate. It is intentionally
//! lightweight so that all crates can depend on it without heavy transitive
//! costs.
//!
//! # Overview
//!
//! - [`ScopeError`] and [`Result`]: shared error handling
//! - [`retry::RetryPolicy`]: bounded retry with exponential backoff
//! - [`observability`]: centralised tracing/logging initialisation

pub mod observability;
pub mod options;
pub mod retry;

pub use options::{Depth, FocusArea, Intent, Recency, SearchMode};
pub use retry::RetryPolicy;

/// Error types used across the toolscope pipeline.
///
/// Only failures that make a run fundamentally impossible live here.
/// Per-page fetch failures are recorded on the page itself and never
/// escalate to a `ScopeError`.
#[derive(thiserror::Error, Debug)]
pub enum ScopeError {
    /// Configuration was incomplete or invalid. Surfaced before any
    /// network call is made.
    #[error("configuration error: {0}")]
    Config(String),

    /// The search provider failed after the retry budget was spent.
    #[error("search retrieval failed: {0}")]
    Retrieval(String),

    /// Every fetched source was failed, empty, or deduplicated away;
    /// synthesis refuses to run ungrounded.
    #[error("no usable web context: all sources failed, were empty, or were duplicates")]
    EmptyContext,

    /// The completion provider failed after the retry budget was spent.
    #[error("briefing synthesis failed: {0}")]
    Synthesis(String),
}

/// Convenient alias for results that use [`ScopeError`].
pub type Result<T> = std::result::Result<T, ScopeError>;
