//! Budgeted, attributed context assembly.
//!
//! Only OK pages participate. Near-duplicates (same host, or identical
//! content signature) are dropped first, then the character budget is dealt
//! out round-robin across the survivors so one long page cannot starve the
//! rest. The whole procedure is deterministic for a given input.

use crate::extract::truncate_at_boundary;
use crate::types::FetchedPage;
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// A slice of one fetched page, tagged with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextChunk {
    pub url: Url,
    pub text: String,
    pub truncated: bool,
}

/// Why a source contributed nothing to the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnusableReason {
    FetchFailed(String),
    Empty,
    DuplicateHost,
    DuplicateContent,
}

impl fmt::Display for UnusableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnusableReason::FetchFailed(reason) => write!(f, "fetch failed: {reason}"),
            UnusableReason::Empty => f.write_str("no readable text"),
            UnusableReason::DuplicateHost => f.write_str("duplicate host"),
            UnusableReason::DuplicateContent => f.write_str("duplicate content"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnusableSource {
    pub url: Url,
    pub reason: UnusableReason,
}

/// Ordered chunks plus the record of everything that was left out.
#[derive(Debug)]
pub struct ContextSet {
    pub chunks: Vec<ContextChunk>,
    pub unusable: Vec<UnusableSource>,
}

impl ContextSet {
    pub fn source_urls(&self) -> Vec<Url> {
        self.chunks.iter().map(|c| c.url.clone()).collect()
    }

    pub fn total_chars(&self) -> usize {
        self.chunks.iter().map(|c| c.text.chars().count()).sum()
    }
}

/// Merge fetched pages into at most `budget_chars` of attributed context.
pub fn assemble(pages: &[FetchedPage], budget_chars: usize) -> ContextSet {
    let mut unusable = Vec::new();
    let mut seen_hosts: HashSet<String> = HashSet::new();
    let mut seen_signatures: HashSet<blake3::Hash> = HashSet::new();
    let mut survivors: Vec<&FetchedPage> = Vec::new();

    for page in pages {
        if let Some(reason) = page.failure_reason() {
            unusable.push(UnusableSource {
                url: page.url.clone(),
                reason: UnusableReason::FetchFailed(reason.to_string()),
            });
            continue;
        }
        if page.text.trim().is_empty() {
            unusable.push(UnusableSource {
                url: page.url.clone(),
                reason: UnusableReason::Empty,
            });
            continue;
        }
        if !seen_hosts.insert(host_key(&page.url)) {
            unusable.push(UnusableSource {
                url: page.url.clone(),
                reason: UnusableReason::DuplicateHost,
            });
            continue;
        }
        if !seen_signatures.insert(content_signature(&page.text)) {
            unusable.push(UnusableSource {
                url: page.url.clone(),
                reason: UnusableReason::DuplicateContent,
            });
            continue;
        }
        survivors.push(page);
    }

    let lens: Vec<usize> = survivors.iter().map(|p| p.text.chars().count()).collect();
    let allocations = round_robin_allocate(&lens, budget_chars);

    let chunks = survivors
        .iter()
        .zip(allocations)
        .map(|(page, alloc)| {
            let (text, cut) = truncate_at_boundary(&page.text, alloc);
            ContextChunk {
                url: page.url.clone(),
                truncated: cut,
                text,
            }
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        target: "context",
        chunk_count = chunks.len(),
        unusable_count = unusable.len(),
        budget_chars,
        "context.assembled"
    );

    ContextSet { chunks, unusable }
}

/// Deal the budget out in rounds of equal shares over the sources that can
/// still absorb more, so leftover capacity from short pages flows to the
/// longer ones instead of being wasted.
fn round_robin_allocate(lens: &[usize], budget: usize) -> Vec<usize> {
    let mut alloc = vec![0usize; lens.len()];
    let mut remaining = budget;

    loop {
        let open: usize = lens
            .iter()
            .zip(&alloc)
            .filter(|(len, got)| *got < *len)
            .count();
        if open == 0 || remaining == 0 {
            break;
        }
        let share = (remaining / open).max(1);
        for (i, len) in lens.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            if alloc[i] >= *len {
                continue;
            }
            let take = share.min(len - alloc[i]).min(remaining);
            alloc[i] += take;
            remaining -= take;
        }
    }

    alloc
}

fn host_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or("-").to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

/// Signature over the normalized head of the text; identical mirrors hash
/// the same even when trailing boilerplate differs.
fn content_signature(text: &str) -> blake3::Hash {
    let normalized: String = text
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .take(2000)
        .collect();
    blake3::hash(normalized.as_bytes())
}
