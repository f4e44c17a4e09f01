//! Values that flow between pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DiscoveryError;

/// An absolute URL believed to reference an image; not yet probed
pub type CandidateUrl = String;

/// A candidate that passed the admissibility probe.
///
/// Only [`crate::validate::ImageValidator`] can mint one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidatedUrl(String);

impl ValidatedUrl {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output of one discovery pass
#[derive(Debug, Default)]
pub struct Discovery {
    /// Candidates in order of appearance, at most `limit` long
    pub candidates: Vec<CandidateUrl>,
    /// Set when the scrape failed; `candidates` is then empty
    pub error: Option<DiscoveryError>,
}

impl Discovery {
    pub fn found(candidates: Vec<CandidateUrl>) -> Self {
        Self {
            candidates,
            error: None,
        }
    }

    pub fn failed(error: DiscoveryError) -> Self {
        Self {
            candidates: Vec::new(),
            error: Some(error),
        }
    }
}

/// Result of describing one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Described(String),
    Failed(String),
}

impl AnalysisOutcome {
    pub fn is_described(&self) -> bool {
        matches!(self, Self::Described(_))
    }
}

impl fmt::Display for AnalysisOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Described(text) => f.write_str(text),
            Self::Failed(reason) => write!(f, "processing failed: {reason}"),
        }
    }
}

/// Description of one image, tied to its slot in the candidate batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAnalysis {
    /// Position of the image in the discovered candidate list
    pub index: usize,
    pub url: String,
    pub outcome: AnalysisOutcome,
}

/// Everything the image half of a run produced
#[derive(Debug, Default)]
pub struct ImageBatch {
    pub discovery: Discovery,
    /// Candidates that passed validation, in discovery order
    pub validated: Vec<ValidatedUrl>,
    /// One entry per validated URL, same order
    pub analyses: Vec<ImageAnalysis>,
}

/// Full enrichment result for one query
#[derive(Debug)]
pub struct Report {
    pub query: String,
    pub text_results: String,
    pub images: ImageBatch,
    /// Combined narrative, or why it could not be produced
    pub synthesis: Result<String, String>,
    /// Set when storing the text results failed
    pub storage_warning: Option<String>,
}

impl ImageBatch {
    /// JSON view for CLI and MCP output
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "candidates": self.discovery.candidates,
            "discovery_error": self.discovery.error.as_ref().map(|e| e.to_string()),
            "validated": self.validated,
            "analyses": self.analyses,
        })
    }
}

impl Report {
    /// JSON view for CLI and MCP output
    pub fn to_json(&self) -> serde_json::Value {
        let (synthesis, synthesis_error) = match &self.synthesis {
            Ok(text) => (Some(text.as_str()), None),
            Err(reason) => (None, Some(reason.as_str())),
        };
        serde_json::json!({
            "query": self.query,
            "text_results": self.text_results,
            "images": self.images.to_json(),
            "synthesis": synthesis,
            "synthesis_error": synthesis_error,
            "storage_warning": self.storage_warning,
        })
    }
}
