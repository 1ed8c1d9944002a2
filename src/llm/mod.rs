#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::Config;

// The model call is a blocking external call with no retry loop; the
// timeout bounds it so a hung server degrades to a single categorized
// fault instead of blocking the analysis forever.
const CHAT_TIMEOUT_SECONDS: u64 = 120;

/// External language-model capability: one prompt in, free-form text out.
///
/// The response is requested as JSON but callers must assume the model did
/// not honor that.
pub trait ChatProvider: Send + Sync {
    fn chat(&self, prompt: &str) -> Result<String>;
}

/// Blocking client for the Ollama chat API.
#[derive(Debug, Clone)]
pub struct OllamaChatClient {
    base_url: Url,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    /// Asks newer Ollama versions to constrain output to JSON.
    format: &'static str,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

impl OllamaChatClient {
    #[inline]
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(CHAT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url,
            model: config.ollama.chat_model.clone(),
            agent,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }
}

impl ChatProvider for OllamaChatClient {
    #[inline]
    fn chat(&self, prompt: &str) -> Result<String> {
        debug!(
            "Sending chat request to model {} (prompt length: {})",
            self.model,
            prompt.len()
        );

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
            format: "json",
            stream: false,
        };

        let url = self
            .base_url
            .join("/api/chat")
            .context("Failed to build chat URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;

        let response_text = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .with_context(|| format!("Chat request to {} failed", self.base_url))?;

        let chat_response: ChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat response")?;

        debug!(
            "Received chat response ({} characters)",
            chat_response.message.content.len()
        );

        Ok(chat_response.message.content)
    }
}
