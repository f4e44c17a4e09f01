//! Results-page scraper
//!
//! Fetches an HTML search results page and walks its `<img src>` tags in
//! document order.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

use super::{collect_candidates, ImageDiscoverer};
use crate::config::DiscoveryConfig;
use crate::error::DiscoveryError;
use crate::types::Discovery;

/// Scrapes image URLs from a configurable search results page
pub struct PageScraper {
    client: Client,
    endpoint: String,
}

impl PageScraper {
    pub fn new(config: &DiscoveryConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Results page URL for `query`
    pub fn page_url(&self, query: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        self.endpoint.replace("{query}", &encoded)
    }

    async fn scrape(&self, query: &str, limit: usize) -> Result<Vec<String>, DiscoveryError> {
        let page_url = self.page_url(query);
        tracing::debug!("Scraping {}", page_url);

        let response = self.client.get(&page_url).send().await?;
        if !response.status().is_success() {
            return Err(DiscoveryError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let sources = extract_image_sources(&body)?;
        Ok(collect_candidates(sources.iter().map(String::as_str), limit))
    }
}

/// All `<img src>` values in document order
pub fn extract_image_sources(html: &str) -> Result<Vec<String>, DiscoveryError> {
    let selector =
        Selector::parse("img[src]").map_err(|e| DiscoveryError::Parse(format!("{e:?}")))?;
    let document = Html::parse_document(html);

    Ok(document
        .select(&selector)
        .filter_map(|el| el.value().attr("src"))
        .map(str::to_string)
        .collect())
}

#[async_trait]
impl ImageDiscoverer for PageScraper {
    fn name(&self) -> &str {
        "scrape"
    }

    async fn discover(&self, query: &str, limit: usize) -> Discovery {
        match self.scrape(query, limit).await {
            Ok(candidates) => {
                tracing::info!("Discovered {} candidate image(s) for '{}'", candidates.len(), query);
                Discovery::found(candidates)
            }
            Err(e) => {
                tracing::warn!("Image discovery failed for '{}': {}", query, e);
                Discovery::failed(e)
            }
        }
    }
}
