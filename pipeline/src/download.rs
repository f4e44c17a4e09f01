//! Resilient image download
//!
//! Each attempt fetches the full body, normalizes it to JPEG and writes a
//! [`TemporaryImageResource`]. Network errors, non-200 statuses, decode and
//! write failures all spend one attempt from the same budget; the last cause
//! is reported in the [`DownloadError`].

use reqwest::{Client, StatusCode};
use std::path::PathBuf;

use crate::config::DownloadConfig;
use crate::error::{DownloadError, DownloadFailure};
use crate::normalize::{normalize_to_jpeg, NormalizeError};
use crate::resource::TemporaryImageResource;
use crate::types::ValidatedUrl;

/// Downloads validated URLs into normalized temporary images
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    config: DownloadConfig,
    work_dir: PathBuf,
}

impl Downloader {
    pub fn new(config: &DownloadConfig, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            work_dir: config.work_dir(),
            config: config.clone(),
        })
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Download with the configured attempt budget
    pub async fn download(
        &self,
        url: &ValidatedUrl,
    ) -> Result<TemporaryImageResource, DownloadError> {
        self.download_with_attempts(url.as_str(), self.config.max_attempts)
            .await
    }

    /// Download `url`, trying at most `max_attempts` times (minimum one)
    pub async fn download_with_attempts(
        &self,
        url: &str,
        max_attempts: u32,
    ) -> Result<TemporaryImageResource, DownloadError> {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(url).await {
                Ok(resource) => {
                    tracing::debug!(
                        "Downloaded {} to {} (attempt {}/{})",
                        url,
                        resource.path().display(),
                        attempt,
                        max_attempts
                    );
                    return Ok(resource);
                }
                Err(failure) if attempt >= max_attempts => {
                    tracing::warn!("Giving up on {} after {} attempt(s): {}", url, attempt, failure);
                    return Err(DownloadError {
                        attempts: attempt,
                        last: failure,
                    });
                }
                Err(failure) => {
                    tracing::debug!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt,
                        max_attempts,
                        url,
                        failure
                    );
                    tokio::time::sleep(self.config.backoff()).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, url: &str) -> Result<TemporaryImageResource, DownloadFailure> {
        let response = self.client.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(DownloadFailure::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        let normalized =
            normalize_to_jpeg(&body, self.config.jpeg_quality).map_err(|e| match e {
                NormalizeError::Decode(e) => DownloadFailure::Decode(e),
                NormalizeError::Encode(e) => DownloadFailure::Encode(e),
            })?;

        let resource = TemporaryImageResource::create(&self.work_dir, &normalized.data)?;
        Ok(resource.with_source(url))
    }
}
