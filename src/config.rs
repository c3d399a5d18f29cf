use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::inference::{
    GatewayConfig, HttpEndpoint, HttpTokenizer, RegressionEndpoint, TextClassificationEndpoint,
    build_http_client,
};

const DEFAULT_RELATIONSHIP_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/kelly9457/bindly-R";
const DEFAULT_SENTIMENT_MODEL_URL: &str =
    "https://api-inference.huggingface.co/models/chihopark/bindly-sentiment-v6";
const DEFAULT_INTIMACY_MODEL_URL: &str = "http://127.0.0.1:8000/predict";
const DEFAULT_TOKENIZER_URL: &str = "http://127.0.0.1:8000/tokenize";

/// Locations and credentials of the scoring services
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bearer token for hosted classifiers (from HF_API_TOKEN)
    pub hf_api_token: Option<String>,
    pub relationship_model_url: String,
    pub sentiment_model_url: String,
    pub intimacy_model_url: String,
    pub tokenizer_url: String,
    /// Per-call timeout
    pub request_timeout: Duration,
    /// Fan-out concurrency bound
    pub max_concurrent_requests: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            hf_api_token: None,
            relationship_model_url: DEFAULT_RELATIONSHIP_MODEL_URL.to_string(),
            sentiment_model_url: DEFAULT_SENTIMENT_MODEL_URL.to_string(),
            intimacy_model_url: DEFAULT_INTIMACY_MODEL_URL.to_string(),
            tokenizer_url: DEFAULT_TOKENIZER_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            max_concurrent_requests: 8,
        }
    }
}

impl ServiceConfig {
    /// Create config from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        config.hf_api_token = lookup("HF_API_TOKEN").filter(|t| !t.trim().is_empty());
        if let Some(url) = lookup("RELATIONSHIP_MODEL_URL") {
            config.relationship_model_url = url;
        }
        if let Some(url) = lookup("SENTIMENT_MODEL_URL") {
            config.sentiment_model_url = url;
        }
        if let Some(url) = lookup("INTIMACY_MODEL_URL") {
            config.intimacy_model_url = url;
        }
        if let Some(url) = lookup("TOKENIZER_URL") {
            config.tokenizer_url = url;
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("REQUEST_TIMEOUT_SECS is not a number: {:?}", secs))?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(max) = lookup("MAX_CONCURRENT_REQUESTS") {
            config.max_concurrent_requests = max
                .parse()
                .with_context(|| format!("MAX_CONCURRENT_REQUESTS is not a number: {:?}", max))?;
        }

        Ok(config)
    }

    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            max_in_flight: self.max_concurrent_requests.max(1),
        }
    }

    /// HTTP client shared by every endpoint built from this config
    pub fn http_client(&self) -> Result<Client> {
        build_http_client(self.request_timeout)
    }

    pub fn relationship_classifier(&self, client: &Client) -> TextClassificationEndpoint {
        TextClassificationEndpoint::new(HttpEndpoint::new(
            client.clone(),
            "relationship-classifier",
            &self.relationship_model_url,
            self.hf_api_token.clone(),
        ))
    }

    pub fn sentiment_scorer(&self, client: &Client) -> TextClassificationEndpoint {
        TextClassificationEndpoint::new(HttpEndpoint::new(
            client.clone(),
            "sentiment-scorer",
            &self.sentiment_model_url,
            self.hf_api_token.clone(),
        ))
    }

    pub fn intimacy_regressor(&self, client: &Client) -> RegressionEndpoint {
        RegressionEndpoint::new(HttpEndpoint::new(
            client.clone(),
            "intimacy-regressor",
            &self.intimacy_model_url,
            None,
        ))
    }

    pub fn tokenizer(&self, client: &Client) -> HttpTokenizer {
        HttpTokenizer::new(HttpEndpoint::new(
            client.clone(),
            "tokenizer",
            &self.tokenizer_url,
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.hf_api_token, None);
        assert_eq!(config.intimacy_model_url, DEFAULT_INTIMACY_MODEL_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.gateway().max_in_flight, 8);
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("HF_API_TOKEN", "hf_abc"),
            ("TOKENIZER_URL", "http://tok:1/tokenize"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("MAX_CONCURRENT_REQUESTS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.hf_api_token.as_deref(), Some("hf_abc"));
        assert_eq!(config.tokenizer_url, "http://tok:1/tokenize");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.gateway().max_in_flight, 1);
    }

    #[test]
    fn test_bad_number() {
        let result = ServiceConfig::from_lookup(lookup(&[("REQUEST_TIMEOUT_SECS", "soon")]));
        assert!(result.is_err());
    }
}
