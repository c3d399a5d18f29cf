use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::InferenceError;

/// Build the shared HTTP client; every call through it carries `timeout`
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to build HTTP client")
}

/// A JSON-over-HTTP endpoint with optional bearer authentication
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    client: Client,
    name: String,
    url: String,
    bearer_token: Option<String>,
}

impl HttpEndpoint {
    pub fn new(
        client: Client,
        name: impl Into<String>,
        url: impl Into<String>,
        bearer_token: Option<String>,
    ) -> Self {
        Self {
            client,
            name: name.into(),
            url: url.into(),
            bearer_token: bearer_token.filter(|t| !t.trim().is_empty()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST `body` as JSON and decode the JSON reply.
    ///
    /// Non-2xx replies become `Http`, send/receive failures `Transport`,
    /// undecodable bodies `Shape`.
    pub async fn post_json<Req, Resp>(&self, body: &Req) -> Result<Resp, InferenceError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut request = self.client.post(&self.url).json(body);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| InferenceError::transport(&self.name, &e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Http {
                endpoint: self.name.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| InferenceError::transport(&self.name, &e))?;
        debug!("{} replied with {} bytes", self.name, bytes.len());

        serde_json::from_slice(&bytes).map_err(|e| InferenceError::shape(&self.name, e.to_string()))
    }
}
