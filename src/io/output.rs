use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    ClassificationSummary, ConversationMapping, NormalizationResult,
    RegressionSummary, SentimentDebugEntry, SpeakerMapping,
};

/// Response of the analysis flow
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub request_id: String,
    pub generated_at: DateTime<Utc>,
    pub normalized_text: String,
    pub speaker_mapping: SpeakerMapping,
    pub conversation_mapping: ConversationMapping,
    pub predicted_relationship: String,
    pub raw_intimacy_score: f64,
    /// Averaged scaled intimacy score
    pub total_score: f64,
    pub diagnostics: AnalysisDiagnostics,
}

/// Chunk-level detail behind the headline numbers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisDiagnostics {
    pub classification: ClassificationSummary,
    pub regression: RegressionSummary,
}

impl AnalysisReport {
    pub fn new(
        request_id: String,
        normalization: NormalizationResult,
        classification: ClassificationSummary,
        regression: RegressionSummary,
    ) -> Self {
        Self {
            request_id,
            generated_at: Utc::now(),
            normalized_text: normalization.normalized_text,
            speaker_mapping: normalization.speaker_mapping,
            conversation_mapping: normalization.conversation_mapping,
            predicted_relationship: classification.relationship.clone(),
            raw_intimacy_score: regression.raw_score,
            total_score: regression.scaled_score,
            diagnostics: AnalysisDiagnostics {
                classification,
                regression,
            },
        }
    }

    /// True when any stream lost chunks to failures
    pub fn is_degraded(&self) -> bool {
        self.diagnostics.classification.degraded || self.diagnostics.regression.degraded
    }
}

/// Response of the sentiment debug pass
#[derive(Debug, Clone, Serialize)]
pub struct SentimentDebugReport {
    pub debug: Vec<SentimentDebugEntry>,
}

/// Serialize any report as pretty JSON
pub fn to_json_string<T: Serialize>(report: &T) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}

/// Write a report as pretty JSON
pub fn write_json<T: Serialize>(report: &T, path: &Path) -> Result<()> {
    let json = to_json_string(report)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write file: {:?}", path))
}
