//! Image Pipeline MCP Server
//!
//! Image discovery, validation and vision-model description over stdio.
//!
//! # Configuration
//! Set `IMAGE_PIPELINE_CONFIG` or create `~/.config/image-pipeline/config.toml`

use image_pipeline::PipelineConfig;
use image_pipeline_mcp::ImagePipelineMcpServer;
use rmcp::{transport::stdio, ServiceExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    image_pipeline::init_tracing("image_pipeline_mcp")?;

    tracing::info!("Starting Image Pipeline MCP Server");

    let config = PipelineConfig::load()?;
    tracing::info!(
        "Ollama URL: {}, SearXNG URL: {}",
        config.llm.url,
        config.search.url
    );

    let server = ImagePipelineMcpServer::new(config)?;
    let service = server.serve(stdio()).await?;

    tracing::info!("Server running, waiting for requests...");
    service.waiting().await?;

    tracing::info!("Server shutting down");
    Ok(())
}
