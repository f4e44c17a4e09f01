//! Admissibility probe for candidate image URLs
//!
//! The probe streams at most `probe_bytes` of the body and decodes only the
//! image header, so a large image is judged without being downloaded.
//! Checks run in order and stop at the first failure:
//!
//! 1. HTTP status must be 200
//! 2. `Content-Type` must start with `image/`
//! 3. the leading bytes must decode as a raster image header
//! 4. the format must be JPEG or PNG
//! 5. width and height must meet the configured minimum

use image::{ImageFormat, ImageReader};
use reqwest::{header::CONTENT_TYPE, Client, Response, StatusCode};
use serde::Serialize;
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;

use crate::config::ValidationConfig;
use crate::types::ValidatedUrl;

const ALLOWED_FORMATS: [ImageFormat; 2] = [ImageFormat::Jpeg, ImageFormat::Png];

/// Why a candidate was turned away
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("content type '{0}' is not an image")]
    ContentType(String),

    #[error("leading bytes are not a recognizable image: {0}")]
    Undecodable(String),

    #[error("format {0} is not allowed")]
    Format(String),

    #[error("image is {width}x{height}, below the minimum size")]
    TooSmall { width: u32, height: u32 },

    #[error("request failed: {0}")]
    Network(String),
}

/// What the probe learned about an admissible image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeInfo {
    pub content_type: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
}

/// Streams a prefix of each candidate and applies the admission rules
#[derive(Clone)]
pub struct ImageValidator {
    client: Client,
    config: ValidationConfig,
}

impl ImageValidator {
    pub fn new(config: &ValidationConfig, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// `true` when `url` passes every admission rule
    pub async fn validate(&self, url: &str) -> bool {
        self.inspect(url).await.is_ok()
    }

    /// Validate and, on success, hand out a [`ValidatedUrl`]
    pub async fn admit(&self, url: &str) -> Option<ValidatedUrl> {
        self.check(url).await.ok()
    }

    /// Like [`admit`](Self::admit), keeping the rejection reason
    pub async fn check(&self, url: &str) -> Result<ValidatedUrl, Rejection> {
        match self.inspect(url).await {
            Ok(info) => {
                tracing::debug!(
                    "Accepted {} ({} {}x{})",
                    url,
                    info.format,
                    info.width,
                    info.height
                );
                Ok(ValidatedUrl::new(url))
            }
            Err(rejection) => {
                tracing::debug!("Rejected {}: {}", url, rejection);
                Err(rejection)
            }
        }
    }

    /// Run the probe and report the first rule that failed
    pub async fn inspect(&self, url: &str) -> Result<ProbeInfo, Rejection> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Rejection::Network(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(Rejection::Status(response.status().as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(Rejection::ContentType(content_type));
        }

        let head = read_prefix(response, self.config.probe_bytes).await?;
        let (format, width, height) = inspect_header(&head)?;
        check_admissible(format, width, height, &self.config)?;

        Ok(ProbeInfo {
            content_type,
            format: format_name(format),
            width,
            height,
        })
    }
}

/// Read at most `limit` bytes of the body, then drop the connection.
async fn read_prefix(mut response: Response, limit: usize) -> Result<Vec<u8>, Rejection> {
    let mut head = Vec::with_capacity(limit);
    while head.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => head.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(e) => return Err(Rejection::Network(e.to_string())),
        }
    }
    head.truncate(limit);
    Ok(head)
}

/// Sniff the format and read dimensions from the image header.
pub fn inspect_header(head: &[u8]) -> Result<(ImageFormat, u32, u32), Rejection> {
    let reader = ImageReader::new(Cursor::new(head))
        .with_guessed_format()
        .map_err(|e| Rejection::Undecodable(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| Rejection::Undecodable("unknown format".into()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| Rejection::Undecodable(e.to_string()))?;
    Ok((format, width, height))
}

fn check_admissible(
    format: ImageFormat,
    width: u32,
    height: u32,
    config: &ValidationConfig,
) -> Result<(), Rejection> {
    if !ALLOWED_FORMATS.contains(&format) {
        return Err(Rejection::Format(format_name(format)));
    }
    if width < config.min_width || height < config.min_height {
        return Err(Rejection::TooSmall { width, height });
    }
    Ok(())
}

fn format_name(format: ImageFormat) -> String {
    format!("{format:?}").to_uppercase()
}
