//! External collaborators
//!
//! The pipeline talks to the outside world through these narrow traits so
//! that each backend can be swapped (or faked in tests) independently.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::StorageError;

pub mod ollama;
pub mod store;

pub use ollama::{OllamaDescriber, OllamaSynthesizer};
pub use store::{NullStore, SqliteStore, UnavailableStore};

/// Turns a query into a free-form summary of text results
#[async_trait]
pub trait TextSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<String>;
}

/// Describes one image
#[async_trait]
pub trait Describer: Send + Sync {
    /// `image` holds normalized JPEG bytes
    async fn describe(&self, image: &[u8], instruction: &str) -> Result<String>;
}

/// Produces the combined narrative from a composed prompt
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, prompt: &str) -> Result<String>;
}

/// Best-effort record of past results
pub trait ResultStore: Send + Sync {
    fn add(&self, document: &str, metadata: &HashMap<String, String>) -> Result<(), StorageError>;
}
