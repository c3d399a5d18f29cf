use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::inference::InferenceError;

/// Generative service that answers a free-text prompt with free text
#[async_trait]
pub trait RewriteService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, InferenceError>;
}

/// Configuration for the chat completions client
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// API key (from OPENAI_API_KEY env var)
    pub api_key: String,
    /// Model to use (e.g., "gpt-4-turbo")
    pub model: String,
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    /// Sampling temperature; `None` leaves the service default
    pub temperature: Option<f64>,
}

impl ChatConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup; OPENAI_API_KEY is required
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .context("OPENAI_API_KEY environment variable not set")?;
        let mut config = Self::new(api_key, "gpt-4-turbo".to_string());
        if let Some(model) = lookup("OPENAI_MODEL") {
            config.model = model;
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: None,
        }
    }
}

/// OpenAI-compatible chat completions client
pub struct ChatClient {
    client: Client,
    config: ChatConfig,
    endpoint: String,
}

impl ChatClient {
    /// Build on a shared HTTP client; its timeout applies to every call
    pub fn new(client: Client, config: ChatConfig) -> Self {
        let endpoint = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        Self {
            client,
            config,
            endpoint,
        }
    }

    /// Send a single user message and return the first choice's text
    pub async fn send_message(&self, user: &str) -> Result<String, InferenceError> {
        const NAME: &str = "chat";

        let request = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![Message {
                role: "user",
                content: user,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| InferenceError::transport(NAME, &e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Http {
                endpoint: NAME.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::shape(NAME, e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| InferenceError::shape(NAME, "no text content in response"))
    }
}

#[async_trait]
impl RewriteService for ChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, InferenceError> {
        self.send_message(prompt).await
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_base_url() {
        let mut config = ChatConfig::new("key".to_string(), "model".to_string());
        config.base_url = "http://localhost:9000/v1/".to_string();
        let client = ChatClient::new(Client::new(), config);
        assert_eq!(client.endpoint, "http://localhost:9000/v1/chat/completions");
    }

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_config_from_lookup() {
        let config = ChatConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-abc"),
            ("OPENAI_BASE_URL", "http://proxy:8080/v1"),
        ]))
        .unwrap();

        assert_eq!(config.api_key, "sk-abc");
        assert_eq!(config.model, "gpt-4-turbo");
        assert_eq!(config.base_url, "http://proxy:8080/v1");
    }

    #[test]
    fn test_config_requires_api_key() {
        assert!(ChatConfig::from_lookup(lookup(&[])).is_err());
        assert!(ChatConfig::from_lookup(lookup(&[("OPENAI_API_KEY", " ")])).is_err());
    }

    #[test]
    fn test_response_without_content() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }
}
