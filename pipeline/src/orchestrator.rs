//! Pipeline orchestration
//!
//! [`ImagePipeline`] runs discovery → validation → download → description
//! for one query, one image at a time, keeping every analysis tied to its
//! candidate index. [`Orchestrator`] wraps it with the text search, the
//! result store and the final synthesis.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::collaborators::{
    Describer, NullStore, OllamaDescriber, OllamaSynthesizer, ResultStore, SqliteStore,
    Synthesizer, TextSearch, UnavailableStore,
};
use crate::config::{DiscoverySource, PipelineConfig};
use crate::discover::{ImageDiscoverer, PageScraper};
use crate::download::Downloader;
use crate::error::PipelineError;
use crate::processor::ImageProcessor;
use crate::prompt::synthesis_prompt;
use crate::searxng::SearxngClient;
use crate::types::{ImageAnalysis, ImageBatch, Report};
use crate::validate::ImageValidator;

/// Discovery, validation and description for one query
pub struct ImagePipeline {
    discoverer: Arc<dyn ImageDiscoverer>,
    validator: ImageValidator,
    processor: ImageProcessor,
    limit: usize,
}

impl ImagePipeline {
    pub fn new(
        discoverer: Arc<dyn ImageDiscoverer>,
        validator: ImageValidator,
        processor: ImageProcessor,
        limit: usize,
    ) -> Self {
        Self {
            discoverer,
            validator,
            processor,
            limit,
        }
    }

    /// Build every stage from configuration, describing with `describer`
    pub fn from_config(config: &PipelineConfig, describer: Arc<dyn Describer>) -> Result<Self> {
        let user_agent = &config.discovery.user_agent;

        let discoverer: Arc<dyn ImageDiscoverer> = match config.discovery.source {
            DiscoverySource::Scrape => Arc::new(
                PageScraper::new(&config.discovery).context("Failed to build discovery client")?,
            ),
            DiscoverySource::Searxng => Arc::new(
                SearxngClient::new(&config.search, user_agent)
                    .context("Failed to build SearXNG client")?,
            ),
        };
        tracing::info!("Using '{}' image discovery", discoverer.name());

        let validator = ImageValidator::new(&config.validation, user_agent)
            .context("Failed to build validation client")?;
        let downloader = Downloader::new(&config.download, user_agent)
            .context("Failed to build download client")?;
        let processor = ImageProcessor::new(
            downloader,
            describer,
            Duration::from_secs(config.llm.timeout_secs),
            config.processing.include_context,
        );

        Ok(Self::new(discoverer, validator, processor, config.discovery.limit))
    }

    /// Validate `config` and describe with its Ollama vision model.
    ///
    /// Touches no result store, so checking a single URL leaves no files behind.
    pub fn with_ollama(config: &PipelineConfig) -> Result<Self, PipelineError> {
        config
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let describer = Arc::new(OllamaDescriber::new(&config.llm.url, &config.llm.vision_model));
        Self::from_config(config, describer).map_err(|e| PipelineError::Config(format!("{e:#}")))
    }

    pub fn discoverer(&self) -> &dyn ImageDiscoverer {
        self.discoverer.as_ref()
    }

    pub fn validator(&self) -> &ImageValidator {
        &self.validator
    }

    pub fn processor(&self) -> &ImageProcessor {
        &self.processor
    }

    /// Run the image half of the pipeline for `query`
    pub async fn run(&self, query: &str) -> ImageBatch {
        let discovery = self.discoverer.discover(query, self.limit).await;

        let mut validated = Vec::new();
        let mut admitted = Vec::new();
        for (index, candidate) in discovery.candidates.iter().enumerate() {
            if let Some(url) = self.validator.admit(candidate).await {
                validated.push(url.clone());
                admitted.push((index, url));
            }
        }
        tracing::info!(
            "{} of {} candidate(s) passed validation",
            admitted.len(),
            discovery.candidates.len()
        );

        let mut analyses = Vec::with_capacity(admitted.len());
        for (index, url) in admitted {
            let url_text = url.as_str().to_string();
            tracing::info!("Processing image {} ({})", index, url_text);
            let outcome = self.processor.process(url, query).await;
            analyses.push(ImageAnalysis {
                index,
                url: url_text,
                outcome,
            });
        }

        ImageBatch {
            discovery,
            validated,
            analyses,
        }
    }
}

/// Full enrichment run: text search, store, images, synthesis
pub struct Orchestrator {
    search: Arc<dyn TextSearch>,
    store: Arc<dyn ResultStore>,
    images: ImagePipeline,
    synthesizer: Arc<dyn Synthesizer>,
    synthesis_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        search: Arc<dyn TextSearch>,
        store: Arc<dyn ResultStore>,
        images: ImagePipeline,
        synthesizer: Arc<dyn Synthesizer>,
        synthesis_timeout: Duration,
    ) -> Self {
        Self {
            search,
            store,
            images,
            synthesizer,
            synthesis_timeout,
        }
    }

    /// Wire SearXNG, Ollama and SQLite from configuration
    pub fn from_config(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let images = ImagePipeline::with_ollama(config)?;

        let search = SearxngClient::new(&config.search, &config.discovery.user_agent)
            .map_err(|e| PipelineError::Config(e.to_string()))?;
        let synthesizer = OllamaSynthesizer::new(&config.llm.url, &config.llm.text_model);

        Ok(Self::new(
            Arc::new(search),
            open_store(config),
            images,
            Arc::new(synthesizer),
            Duration::from_secs(config.llm.timeout_secs),
        ))
    }

    pub fn images(&self) -> &ImagePipeline {
        &self.images
    }

    /// Run the whole flow; only a failed text search aborts it
    pub async fn run(&self, query: &str) -> Result<Report, PipelineError> {
        tracing::info!("Running pipeline for '{}'", query);

        let text_results = self
            .search
            .search(query)
            .await
            .map_err(|e| PipelineError::Search(format!("{e:#}")))?;

        let metadata = HashMap::from([("query".to_string(), query.to_string())]);
        let storage_warning = match self.store.add(&text_results, &metadata) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!("Failed to store results: {}", e);
                Some(format!("Failed to store results: {e}"))
            }
        };

        let images = self.images.run(query).await;

        let prompt = synthesis_prompt(query, &text_results, &images.analyses);
        let synthesis = match tokio::time::timeout(
            self.synthesis_timeout,
            self.synthesizer.synthesize(&prompt),
        )
        .await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(format!("synthesis failed: {e:#}")),
            Err(_) => Err(format!(
                "synthesis timed out after {:?}",
                self.synthesis_timeout
            )),
        };
        if let Err(reason) = &synthesis {
            tracing::warn!("{}", reason);
        }

        Ok(Report {
            query: query.to_string(),
            text_results,
            images,
            synthesis,
            storage_warning,
        })
    }
}

fn open_store(config: &PipelineConfig) -> Arc<dyn ResultStore> {
    if !config.store.enabled {
        return Arc::new(NullStore);
    }

    let Some(path) = config.store.path.clone().or_else(SqliteStore::default_path) else {
        return Arc::new(UnavailableStore::new("no home directory for the result store"));
    };

    match SqliteStore::open_at(&path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::warn!("Result store unavailable: {}", e);
            Arc::new(UnavailableStore::new(e.to_string()))
        }
    }
}
