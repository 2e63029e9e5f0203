//! Web discovery and acquisition for the briefing pipeline.
//!
//! - Search provider client (`search`) for ranked result discovery
//! - Page fetching with timeout and size caps (`fetch`)
//! - Visible-text extraction from HTML (`extract`)
//! - Budgeted, attributed context assembly (`context`)

pub mod context;
pub mod extract;
pub mod fetch;
pub mod search;
pub mod types;

pub use context::{ContextChunk, ContextSet, UnusableReason, UnusableSource};
pub use fetch::PageFetcher;
pub use search::{SearchClient, SearchOutcome};
pub use types::{FetchStatus, FetchedPage, SearchQuery, SearchResult};
