//! SearXNG client
//!
//! Serves two roles: the text search provider (general results rendered as a
//! plain-text summary) and an alternative image discoverer (`img_src` of
//! image results). See: https://docs.searxng.org/dev/search_api.html

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::collaborators::TextSearch;
use crate::config::SearchConfig;
use crate::discover::{collect_candidates, ImageDiscoverer};
use crate::error::DiscoveryError;
use crate::types::Discovery;

/// SearXNG instance client
pub struct SearxngClient {
    client: Client,
    config: SearchConfig,
}

// SearXNG API response types
#[derive(Debug, Deserialize)]
struct SearxngResponse {
    results: Vec<SearxngResult>,
}

#[derive(Debug, Deserialize)]
struct SearxngResult {
    title: String,
    url: String,
    content: Option<String>,
    img_src: Option<String>,
}

impl SearxngClient {
    pub fn new(config: &SearchConfig, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn is_available(&self) -> bool {
        !self.config.url.is_empty()
    }

    async fn query(&self, query: &str, category: Option<&str>) -> Result<SearxngResponse> {
        if !self.is_available() {
            return Err(anyhow!("SearXNG URL not configured"));
        }

        let url = format!("{}/search", self.config.url.trim_end_matches('/'));

        let mut params = vec![
            ("q", query.to_string()),
            ("format", "json".to_string()),
            ("pageno", "1".to_string()),
        ];
        if let Some(category) = category {
            params.push(("categories", category.to_string()));
        }
        if !self.config.engines.is_empty() {
            params.push(("engines", self.config.engines.clone()));
        }

        let response = self.client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("SearXNG error {}: {}", status, text));
        }

        Ok(response.json().await?)
    }
}

/// Render results as numbered plain-text entries
fn summarize(results: &[SearxngResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let snippet = r.content.as_deref().unwrap_or("").trim();
            format!("{}. {}\n   {}\n   {}", i + 1, r.title, r.url, snippet)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl TextSearch for SearxngClient {
    async fn search(&self, query: &str) -> Result<String> {
        let response = self.query(query, None).await?;

        // Image-only hits carry an img_src and no useful text
        let results: Vec<SearxngResult> = response
            .results
            .into_iter()
            .filter(|r| r.img_src.as_ref().map_or(true, |s| s.is_empty()))
            .take(self.config.max_results)
            .collect();

        if results.is_empty() {
            return Ok(format!("No text results found for '{}'.", query));
        }
        Ok(summarize(&results))
    }
}

#[async_trait]
impl ImageDiscoverer for SearxngClient {
    fn name(&self) -> &str {
        "searxng"
    }

    async fn discover(&self, query: &str, limit: usize) -> Discovery {
        match self.query(query, Some("images")).await {
            Ok(response) => {
                let candidates = collect_candidates(
                    response.results.iter().filter_map(|r| r.img_src.as_deref()),
                    limit,
                );
                tracing::info!(
                    "SearXNG returned {} candidate image(s) for '{}'",
                    candidates.len(),
                    query
                );
                Discovery::found(candidates)
            }
            Err(e) => {
                tracing::warn!("SearXNG image discovery failed for '{}': {}", query, e);
                Discovery::failed(DiscoveryError::Backend(e.to_string()))
            }
        }
    }
}
