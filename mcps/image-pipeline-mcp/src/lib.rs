//! Image Pipeline MCP Library
//!
//! Exposes the image pipeline as MCP tools: discover candidate images for a
//! query, probe a URL, describe one image, or run the full enrichment flow.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use image_pipeline_mcp::ImagePipelineMcpServer;
//!
//! let server = ImagePipelineMcpServer::new(PipelineConfig::load()?)?;
//! // Serve via stdio or an in-memory transport
//! ```

pub mod server;

pub use server::ImagePipelineMcpServer;

pub use server::{AnalyzeImageParams, DiscoverImagesParams, RunPipelineParams, ValidateImageParams};
