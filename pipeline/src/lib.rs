//! Image Pipeline Library
//!
//! Query-driven image enrichment: discover candidate image URLs for a query,
//! probe them cheaply, download and normalize the admissible ones, describe
//! each with a vision model and fold everything into one narrative.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use image_pipeline::{Orchestrator, PipelineConfig};
//!
//! let config = PipelineConfig::load()?;
//! let orchestrator = Orchestrator::from_config(&config)?;
//! let report = orchestrator.run("red panda").await?;
//! for analysis in &report.images.analyses {
//!     println!("#{} {}: {}", analysis.index, analysis.url, analysis.outcome);
//! }
//! ```
//!
//! # Configuration
//! Set `IMAGE_PIPELINE_CONFIG` or create `~/.config/image-pipeline/config.toml`

pub mod collaborators;
pub mod config;
pub mod discover;
pub mod download;
pub mod error;
pub mod init;
pub mod normalize;
pub mod orchestrator;
pub mod processor;
pub mod prompt;
pub mod resource;
pub mod searxng;
pub mod types;
pub mod validate;

pub use config::PipelineConfig;
pub use download::Downloader;
pub use error::{DownloadError, PipelineError};
pub use init::init_tracing;
pub use orchestrator::{ImagePipeline, Orchestrator};
pub use processor::{ImageInput, ImageProcessor};
pub use resource::TemporaryImageResource;
pub use types::{AnalysisOutcome, Discovery, ImageAnalysis, ImageBatch, Report, ValidatedUrl};
pub use validate::{ImageValidator, ProbeInfo, Rejection};
