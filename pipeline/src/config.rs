//! Configuration loading for the image pipeline
//!
//! Configuration is loaded from:
//! 1. Environment variable IMAGE_PIPELINE_CONFIG (path to a TOML file)
//! 2. ~/.config/image-pipeline/config.toml
//! 3. Default values
//!
//! `SEARXNG_URL`, `OLLAMA_URL` and `IMAGE_PIPELINE_WORK_DIR` override the
//! loaded values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Candidate URL discovery
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Admissibility probe
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Full download + normalization
    #[serde(default)]
    pub download: DownloadConfig,
    /// Per-image description
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// Ollama models used for description and synthesis
    #[serde(default)]
    pub llm: LlmConfig,
    /// Text search provider (SearXNG)
    #[serde(default)]
    pub search: SearchConfig,
    /// Best-effort result store
    #[serde(default)]
    pub store: StoreConfig,
}

/// Where candidate image URLs come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    /// Scrape `<img src>` tags from a search results page
    Scrape,
    /// Ask the SearXNG JSON API for image results
    Searxng,
}

/// Discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_source")]
    pub source: DiscoverySource,
    /// Results page template; `{query}` is replaced by the encoded query
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Maximum number of candidates per query
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_discovery_timeout")]
    pub timeout_secs: u64,
}

/// Validation probe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_validation_timeout")]
    pub timeout_secs: u64,
    /// How much of the body the probe may read
    #[serde(default = "default_probe_bytes")]
    pub probe_bytes: usize,
    #[serde(default = "default_min_dimension")]
    pub min_width: u32,
    #[serde(default = "default_min_dimension")]
    pub min_height: u32,
}

/// Download configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    #[serde(default = "default_download_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay between attempts
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// JPEG quality (1-100) of the normalized image
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// Directory for temporary images; OS temp dir when unset
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

/// Processing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Append the query to the description instruction
    #[serde(default)]
    pub include_context: bool,
}

/// Ollama configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,
    /// Model used for the combined narrative
    #[serde(default = "default_text_model")]
    pub text_model: String,
    /// Model used for per-image descriptions
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

/// Text search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// SearXNG instance URL
    #[serde(default = "default_searxng_url")]
    pub url: String,
    /// Engines to use (comma-separated, empty = use instance defaults)
    #[serde(default)]
    pub engines: String,
    /// Maximum number of text results in the summary
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

/// Result store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// SQLite database path; ~/.image-pipeline/results.db when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_source() -> DiscoverySource {
    DiscoverySource::Scrape
}

fn default_endpoint() -> String {
    "https://www.google.com/search?q={query}&tbm=isch".to_string()
}

fn default_limit() -> usize {
    3
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_discovery_timeout() -> u64 {
    10
}

fn default_validation_timeout() -> u64 {
    5
}

fn default_probe_bytes() -> usize {
    32 * 1024
}

fn default_min_dimension() -> u32 {
    100
}

fn default_download_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_text_model() -> String {
    "llama2".to_string()
}

fn default_vision_model() -> String {
    "llava".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_searxng_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_max_results() -> usize {
    10
}

fn default_search_timeout() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            endpoint: default_endpoint(),
            limit: default_limit(),
            user_agent: default_user_agent(),
            timeout_secs: default_discovery_timeout(),
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_validation_timeout(),
            probe_bytes: default_probe_bytes(),
            min_width: default_min_dimension(),
            min_height: default_min_dimension(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_download_timeout(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            jpeg_quality: default_jpeg_quality(),
            work_dir: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            text_model: default_text_model(),
            vision_model: default_vision_model(),
            timeout_secs: default_llm_timeout(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_searxng_url(),
            engines: String::new(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            path: None,
        }
    }
}

impl DownloadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    /// Work directory for temporary images
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl PipelineConfig {
    /// Load configuration from file or use defaults, then apply env overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path)?,
            Some(path) => {
                tracing::info!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            None => {
                tracing::info!("No config path specified, using defaults");
                Self::default()
            }
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit config file, then apply env overrides
    pub fn load_at(path: &Path) -> Result<Self> {
        let mut config = Self::load_from_path(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific TOML file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        tracing::info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("SEARXNG_URL") {
            self.search.url = url;
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            self.llm.url = url;
        }
        if let Ok(dir) = std::env::var("IMAGE_PIPELINE_WORK_DIR") {
            self.download.work_dir = Some(PathBuf::from(dir));
        }
    }

    /// Reject values no component can work with
    pub fn validate(&self) -> Result<()> {
        if self.discovery.endpoint.trim().is_empty() {
            bail!("discovery.endpoint must not be empty");
        }
        if self.discovery.timeout_secs == 0
            || self.validation.timeout_secs == 0
            || self.download.timeout_secs == 0
            || self.llm.timeout_secs == 0
            || self.search.timeout_secs == 0
        {
            bail!("timeouts must be greater than zero");
        }
        if !(1..=100).contains(&self.download.jpeg_quality) {
            bail!(
                "download.jpeg_quality must be in 1..=100, got {}",
                self.download.jpeg_quality
            );
        }
        if self.validation.probe_bytes == 0 {
            bail!("validation.probe_bytes must be greater than zero");
        }
        Ok(())
    }

    /// Find the configuration file path
    fn find_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("IMAGE_PIPELINE_CONFIG") {
            return Some(PathBuf::from(path));
        }

        dirs::config_dir().map(|dir| dir.join("image-pipeline").join("config.toml"))
    }
}
