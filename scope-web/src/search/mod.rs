//! Search provider client: one query in, ranked web sources out.

mod client;
mod types;

pub use client::{SearchClient, SearchOutcome};
pub use types::{SearchApiResponse, SourceHit};
