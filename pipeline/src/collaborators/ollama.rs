//! Ollama-backed description and synthesis

use anyhow::Result;
use async_trait::async_trait;
use base64::Engine;
use ollama_rs::{
    generation::{
        chat::{request::ChatMessageRequest, ChatMessage},
        images::Image,
    },
    Ollama,
};

use super::{Describer, Synthesizer};

fn connect(url: &str) -> Ollama {
    let url = url::Url::parse(url).ok();
    let host = url
        .as_ref()
        .and_then(|u| u.host_str())
        .unwrap_or("localhost")
        .to_string();
    let scheme = url.as_ref().map(|u| u.scheme()).unwrap_or("http").to_string();
    let port = url.as_ref().and_then(|u| u.port()).unwrap_or(11434);

    Ollama::new(format!("{}://{}", scheme, host), port)
}

/// Describes images with a vision model (e.g. `llava`)
pub struct OllamaDescriber {
    client: Ollama,
    model: String,
}

impl OllamaDescriber {
    pub fn new(url: &str, model: &str) -> Self {
        Self {
            client: connect(url),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Describer for OllamaDescriber {
    async fn describe(&self, image: &[u8], instruction: &str) -> Result<String> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let message =
            ChatMessage::user(instruction.to_string()).with_images(vec![Image::from_base64(encoded)]);

        let request = ChatMessageRequest::new(self.model.clone(), vec![message]);
        let response = self.client.send_chat_messages(request).await?;

        Ok(response.message.content)
    }
}

/// Writes the combined narrative with a text model (e.g. `llama2`)
pub struct OllamaSynthesizer {
    client: Ollama,
    model: String,
}

impl OllamaSynthesizer {
    pub fn new(url: &str, model: &str) -> Self {
        Self {
            client: connect(url),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl Synthesizer for OllamaSynthesizer {
    async fn synthesize(&self, prompt: &str) -> Result<String> {
        let request = ChatMessageRequest::new(
            self.model.clone(),
            vec![ChatMessage::user(prompt.to_string())],
        );

        let response = self.client.send_chat_messages(request).await?;

        Ok(response.message.content)
    }
}
