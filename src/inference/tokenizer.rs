use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{HttpEndpoint, InferenceError};
use crate::models::TokenSpan;

/// External tokenizer: reports where each token sits in the text
#[async_trait]
pub trait Tokenizer: Send + Sync {
    async fn token_spans(&self, text: &str) -> Result<Vec<TokenSpan>, InferenceError>;
}

#[derive(Serialize)]
struct TokenizeRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct TokenizeResponse {
    offsets: Vec<(usize, usize)>,
}

/// Tokenizer service reached over HTTP (`{text}` → `{offsets: [[start, end], ...]}`)
#[derive(Debug, Clone)]
pub struct HttpTokenizer {
    http: HttpEndpoint,
}

impl HttpTokenizer {
    pub fn new(http: HttpEndpoint) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Tokenizer for HttpTokenizer {
    async fn token_spans(&self, text: &str) -> Result<Vec<TokenSpan>, InferenceError> {
        let response: TokenizeResponse = self.http.post_json(&TokenizeRequest { text }).await?;
        Ok(response
            .offsets
            .into_iter()
            .map(|(start, end)| TokenSpan::new(start, end))
            .collect())
    }
}
