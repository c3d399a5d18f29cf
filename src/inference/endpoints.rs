use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{HttpEndpoint, InferenceError};
use crate::models::{LabelScore, RegressionOutput};

/// A scoring service that turns one text into one structured result
#[async_trait]
pub trait InferenceEndpoint: Send + Sync {
    type Output: Send;

    /// Name used in logs and errors
    fn name(&self) -> &str;

    async fn infer(&self, input: &str) -> Result<Self::Output, InferenceError>;
}

/// Relationship classifier or sentiment scorer
pub type LabelEndpoint = dyn InferenceEndpoint<Output = Vec<LabelScore>>;
/// Intimacy regressor
pub type IntimacyEndpoint = dyn InferenceEndpoint<Output = RegressionOutput>;

#[derive(Serialize)]
struct ClassificationRequest<'a> {
    inputs: &'a str,
    parameters: ClassificationParameters,
}

#[derive(Serialize)]
struct ClassificationParameters {
    truncation: bool,
}

/// Hosted text-classification replies come either batched (`[[..]]`) or flat (`[..]`)
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            ClassificationResponse::Nested(batches) => {
                batches.into_iter().next().unwrap_or_default()
            }
            ClassificationResponse::Flat(scores) => scores,
        }
    }
}

/// Text-classification endpoint (`{inputs, parameters: {truncation}}` → label scores).
///
/// An empty reply list is a valid "no prediction" result.
#[derive(Debug, Clone)]
pub struct TextClassificationEndpoint {
    http: HttpEndpoint,
    truncation: bool,
}

impl TextClassificationEndpoint {
    pub fn new(http: HttpEndpoint) -> Self {
        Self {
            http,
            truncation: true,
        }
    }

    pub fn with_truncation(mut self, truncation: bool) -> Self {
        self.truncation = truncation;
        self
    }
}

#[async_trait]
impl InferenceEndpoint for TextClassificationEndpoint {
    type Output = Vec<LabelScore>;

    fn name(&self) -> &str {
        self.http.name()
    }

    async fn infer(&self, input: &str) -> Result<Self::Output, InferenceError> {
        let request = ClassificationRequest {
            inputs: input,
            parameters: ClassificationParameters {
                truncation: self.truncation,
            },
        };
        let response: ClassificationResponse = self.http.post_json(&request).await?;
        Ok(response.into_scores())
    }
}

#[derive(Serialize)]
struct RegressionRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct RegressionWire {
    #[serde(default)]
    raw_score: Option<f64>,
    #[serde(default)]
    scaled_score: Option<f64>,
}

/// Intimacy regressor (`{text}` → `{raw_score, scaled_score}`).
///
/// Missing or null scores read as 0.
#[derive(Debug, Clone)]
pub struct RegressionEndpoint {
    http: HttpEndpoint,
}

impl RegressionEndpoint {
    pub fn new(http: HttpEndpoint) -> Self {
        Self { http }
    }
}

#[async_trait]
impl InferenceEndpoint for RegressionEndpoint {
    type Output = RegressionOutput;

    fn name(&self) -> &str {
        self.http.name()
    }

    async fn infer(&self, input: &str) -> Result<Self::Output, InferenceError> {
        let wire: RegressionWire = self.http.post_json(&RegressionRequest { text: input }).await?;
        Ok(RegressionOutput {
            raw_score: wire.raw_score.unwrap_or(0.0),
            scaled_score: wire.scaled_score.unwrap_or(0.0),
        })
    }
}
