//! Single-page fetching.
//!
//! Every failure mode (timeout, non-2xx, decode, over-size) is recorded on
//! the returned [`FetchedPage`] and never raised: a lost page costs context,
//! not the run.

use crate::extract::{extract_visible_text, looks_like_html, normalize_whitespace, truncate_at_boundary};
use crate::types::{FetchedPage, SearchResult};
use scope_common::ScopeError;
use scope_http::{HttpClient, RequestOpts};
use std::time::Duration;

/// Hard cap on raw response bodies; pages larger than this are recorded
/// as failed rather than buffered.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub struct PageFetcher {
    http: HttpClient,
    page_char_cap: usize,
}

impl PageFetcher {
    pub fn new(page_char_cap: usize) -> scope_common::Result<Self> {
        let http = HttpClient::unanchored()
            .map_err(|e| ScopeError::Config(format!("fetch client init failed: {e}")))?;
        Ok(Self {
            http,
            page_char_cap,
        })
    }

    /// Fetch and clean the page behind one search result. The snippet is
    /// used as stand-in content when the page yields no readable text.
    pub async fn fetch(&self, result: &SearchResult, timeout: Duration) -> FetchedPage {
        let url = result.url.clone();

        let body = self
            .http
            .get_text(
                url.as_str(),
                RequestOpts {
                    timeout: Some(timeout),
                    retries: Some(0),
                    allow_absolute: true,
                    ..Default::default()
                },
                MAX_BODY_BYTES,
            )
            .await;

        let body = match body {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(target: "web.fetch", url = %url, error = %e, "fetch.failed");
                return FetchedPage::failed(url, result.rank, e.to_string());
            }
        };

        let mut text = if looks_like_html(&body) {
            extract_visible_text(&body)
        } else {
            normalize_whitespace(&body)
        };

        if text.is_empty() {
            // Nothing readable; the search snippet is better than nothing.
            text = result.snippet.clone();
        }

        let (text, truncated) = truncate_at_boundary(&text, self.page_char_cap);
        tracing::debug!(
            target: "web.fetch",
            url = %url,
            chars = text.chars().count(),
            truncated,
            "fetch.ok"
        );
        FetchedPage::ok(url, result.rank, text)
    }
}
