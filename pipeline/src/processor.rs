//! Per-image description
//!
//! The processor owns each temporary image for exactly one description call
//! and releases it before returning, whatever the outcome. Failures become
//! [`AnalysisOutcome::Failed`] so a bad image never aborts the batch.

use std::sync::Arc;
use std::time::Duration;

use crate::collaborators::Describer;
use crate::download::Downloader;
use crate::error::ProcessingError;
use crate::resource::TemporaryImageResource;
use crate::types::{AnalysisOutcome, ValidatedUrl};

/// Instruction sent with every image
pub const DESCRIBE_INSTRUCTION: &str = "Describe this image";

/// An image to describe: still remote, or already on disk
pub enum ImageInput {
    Url(ValidatedUrl),
    Resource(TemporaryImageResource),
}

impl From<ValidatedUrl> for ImageInput {
    fn from(url: ValidatedUrl) -> Self {
        Self::Url(url)
    }
}

impl From<TemporaryImageResource> for ImageInput {
    fn from(resource: TemporaryImageResource) -> Self {
        Self::Resource(resource)
    }
}

pub struct ImageProcessor {
    downloader: Downloader,
    describer: Arc<dyn Describer>,
    timeout: Duration,
    include_context: bool,
}

impl ImageProcessor {
    pub fn new(
        downloader: Downloader,
        describer: Arc<dyn Describer>,
        timeout: Duration,
        include_context: bool,
    ) -> Self {
        Self {
            downloader,
            describer,
            timeout,
            include_context,
        }
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Describe one image; never fails, never leaves a temporary file behind
    pub async fn process(&self, input: impl Into<ImageInput>, context: &str) -> AnalysisOutcome {
        match self.try_process(input.into(), context).await {
            Ok(text) => AnalysisOutcome::Described(text),
            Err(e) => {
                tracing::warn!("Image processing failed: {}", e);
                AnalysisOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_process(&self, input: ImageInput, context: &str) -> Result<String, ProcessingError> {
        let resource = match input {
            ImageInput::Resource(resource) => resource,
            ImageInput::Url(url) => self.downloader.download(&url).await?,
        };

        let result = self.describe(&resource, context).await;

        if let Err(e) = resource.release() {
            tracing::warn!("Failed to delete temporary image: {}", e);
        }
        result
    }

    async fn describe(
        &self,
        resource: &TemporaryImageResource,
        context: &str,
    ) -> Result<String, ProcessingError> {
        let bytes = resource.read().map_err(ProcessingError::Read)?;
        let instruction = self.instruction(context);

        match tokio::time::timeout(self.timeout, self.describer.describe(&bytes, &instruction)).await
        {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ProcessingError::Describe(e.to_string())),
            Err(_) => Err(ProcessingError::Timeout(self.timeout)),
        }
    }

    fn instruction(&self, context: &str) -> String {
        if self.include_context && !context.trim().is_empty() {
            format!("{DESCRIBE_INSTRUCTION}. It was found while searching for: {context}")
        } else {
            DESCRIBE_INSTRUCTION.to_string()
        }
    }
}
