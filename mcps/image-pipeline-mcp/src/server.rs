//! MCP Server implementation for the image pipeline
//!
//! Each tool maps onto one pipeline stage, plus `run_pipeline` for the full
//! flow. Per-image failures are reported inside the JSON result; only a
//! failed text search or a serialization error becomes an MCP error.

use anyhow::Result;
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use image_pipeline::discover::ImageDiscoverer;
use image_pipeline::{Orchestrator, PipelineConfig};

/// The Image Pipeline MCP Server
#[derive(Clone)]
pub struct ImagePipelineMcpServer {
    orchestrator: Arc<Orchestrator>,
    config: PipelineConfig,
    tool_router: ToolRouter<Self>,
}

// ============================================================================
// Parameter Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DiscoverImagesParams {
    /// The search query
    #[schemars(description = "The image search query string")]
    pub query: String,
    /// Maximum number of candidates to return
    #[schemars(description = "Maximum number of candidate URLs (default: 3)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ValidateImageParams {
    /// URL to probe
    #[schemars(description = "Absolute http(s) URL of the image")]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct AnalyzeImageParams {
    /// URL to describe
    #[schemars(description = "Absolute http(s) URL of the image")]
    pub url: String,
    /// Search context passed to the vision model
    #[schemars(description = "Optional query the image relates to")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RunPipelineParams {
    /// The query to enrich
    #[schemars(description = "The query to search text and images for")]
    pub query: String,
}

fn json_result(value: &impl Serialize) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// Tool Router Implementation
// ============================================================================

#[tool_router]
impl ImagePipelineMcpServer {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let orchestrator = Orchestrator::from_config(&config)?;
        tracing::info!(
            "Using '{}' image discovery",
            orchestrator.images().discoverer().name()
        );

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            config,
            tool_router: Self::tool_router(),
        })
    }

    // ========================================================================
    // Stage Tools
    // ========================================================================

    #[tool(description = "Find candidate image URLs for a query. Candidates are not yet validated.")]
    async fn discover_images(
        &self,
        Parameters(params): Parameters<DiscoverImagesParams>,
    ) -> Result<CallToolResult, McpError> {
        let limit = params.limit.unwrap_or(self.config.discovery.limit);

        tracing::info!("Discovering images for: {} (limit: {})", params.query, limit);

        let discovery = self
            .orchestrator
            .images()
            .discoverer()
            .discover(&params.query, limit)
            .await;

        json_result(&serde_json::json!({
            "candidates": discovery.candidates,
            "error": discovery.error.map(|e| e.to_string()),
        }))
    }

    #[tool(description = "Check whether a URL serves a JPEG or PNG of at least 100x100 pixels. Reads only the first bytes of the body.")]
    async fn validate_image(
        &self,
        Parameters(params): Parameters<ValidateImageParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("Validating: {}", params.url);

        let value = match self.orchestrator.images().validator().inspect(&params.url).await {
            Ok(info) => serde_json::json!({ "url": params.url, "valid": true, "info": info }),
            Err(rejection) => serde_json::json!({
                "url": params.url,
                "valid": false,
                "reason": rejection.to_string(),
            }),
        };

        json_result(&value)
    }

    #[tool(description = "Validate, download and describe a single image with the vision model.")]
    async fn analyze_image(
        &self,
        Parameters(params): Parameters<AnalyzeImageParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("Analyzing: {}", params.url);

        let images = self.orchestrator.images();
        let url = match images.validator().check(&params.url).await {
            Ok(url) => url,
            Err(rejection) => {
                return json_result(&serde_json::json!({
                    "url": params.url,
                    "valid": false,
                    "reason": rejection.to_string(),
                }));
            }
        };

        let context = params.context.unwrap_or_default();
        let outcome = images.processor().process(url, &context).await;

        json_result(&serde_json::json!({
            "url": params.url,
            "valid": true,
            "outcome": outcome,
        }))
    }

    // ========================================================================
    // Full Pipeline
    // ========================================================================

    #[tool(description = "Run the full enrichment: text search, image discovery and description, and a combined analysis.")]
    async fn run_pipeline(
        &self,
        Parameters(params): Parameters<RunPipelineParams>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!("Running pipeline for: {}", params.query);

        let report = self
            .orchestrator
            .run(&params.query)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        json_result(&report.to_json())
    }

    #[tool(description = "Get the current pipeline configuration.")]
    async fn get_config(&self) -> Result<CallToolResult, McpError> {
        json_result(&self.config)
    }
}

// ============================================================================
// Server Handler Implementation
// ============================================================================

#[tool_handler]
impl rmcp::ServerHandler for ImagePipelineMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Image Pipeline MCP Server - finds images for a query, validates them \
                 cheaply, downloads and normalizes the admissible ones and describes \
                 them with a local vision model (Ollama)."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
