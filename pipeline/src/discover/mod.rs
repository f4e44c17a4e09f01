//! Candidate image URL discovery
//!
//! A discoverer turns a query into a short, ordered list of absolute image
//! URLs. Discovery never fails the pipeline: errors are reported inside the
//! returned [`Discovery`] alongside an empty candidate list.

use async_trait::async_trait;
use std::collections::HashSet;

use crate::types::{CandidateUrl, Discovery};

pub mod scrape;

pub use scrape::PageScraper;

/// Trait for candidate URL sources
#[async_trait]
pub trait ImageDiscoverer: Send + Sync {
    /// Get the name of this source
    fn name(&self) -> &str;

    /// Re-scrape the source for `query` and return at most `limit` candidates
    async fn discover(&self, query: &str, limit: usize) -> Discovery;
}

/// Keep absolute http(s) URLs, drop duplicates, stop at `limit`.
pub(crate) fn collect_candidates<'a>(
    sources: impl IntoIterator<Item = &'a str>,
    limit: usize,
) -> Vec<CandidateUrl> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .map(str::trim)
        .filter(|src| is_absolute_http(src))
        .filter(|src| seen.insert(src.to_string()))
        .take(limit)
        .map(str::to_string)
        .collect()
}

fn is_absolute_http(src: &str) -> bool {
    match url::Url::parse(src) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}
