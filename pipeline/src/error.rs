//! Error types for each pipeline stage
//!
//! Everything below the orchestrator is recovered and turned into a
//! per-item value; only [`PipelineError`] ever escapes a run.

use std::time::Duration;
use thiserror::Error;

/// Scraping the results page failed; the run continues with no candidates
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("discovery request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("discovery endpoint returned HTTP {0}")]
    Status(u16),

    #[error("could not parse results page: {0}")]
    Parse(String),

    #[error("discovery backend failed: {0}")]
    Backend(String),
}

/// Cause of a single failed download attempt
#[derive(Debug, Error)]
pub enum DownloadFailure {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("decode failed: {0}")]
    Decode(#[source] image::ImageError),

    #[error("encode failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("could not write temporary image: {0}")]
    Io(#[from] std::io::Error),
}

/// Every download attempt failed
#[derive(Debug, Error)]
#[error("download failed after {attempts} attempt(s): {last}")]
pub struct DownloadError {
    pub attempts: u32,
    /// Cause of the final attempt
    #[source]
    pub last: DownloadFailure,
}

/// Failure while turning one image into a description
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("could not read temporary image: {0}")]
    Read(#[source] std::io::Error),

    #[error("description failed: {0}")]
    Describe(String),

    #[error("description timed out after {0:?}")]
    Timeout(Duration),
}

/// Storing text results failed; surfaced as a warning only
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("could not encode metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("could not open store: {0}")]
    Open(String),
}

/// Errors that abort a whole run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("text search failed: {0}")]
    Search(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}
