use tracing::{debug, info, warn};

use crate::inference::{InferenceGateway, LabelEndpoint};
use crate::io::parse_normalized_text;
use crate::models::{
    LabelScore, ScoredSentence, SelectionOutcome, SentimentDebugEntry, SpeakerCode,
};

/// Configuration for negative sentence selection
#[derive(Debug, Clone)]
pub struct SelectionConfig {
    /// Label of the sentiment model that carries the negative probability
    pub negative_label: String,
    /// Minimum negativity to keep a sentence (inclusive)
    pub threshold: f64,
    /// Maximum number of sentences returned
    pub top_k: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            negative_label: "LABEL_1".to_string(),
            threshold: 0.5,
            top_k: 3,
        }
    }
}

/// Score of the negative label, or 0 when the model did not report it
pub fn negativity(scores: &[LabelScore], negative_label: &str) -> f64 {
    scores
        .iter()
        .find(|s| s.label == negative_label)
        .map(|s| s.score)
        .unwrap_or(0.0)
}

/// Threshold, rank and truncate scored sentences.
///
/// The sort is stable, so equal scores keep transcript order.
pub fn rank_sentences(scored: Vec<ScoredSentence>, config: &SelectionConfig) -> SelectionOutcome {
    let mut candidates: Vec<ScoredSentence> = scored
        .into_iter()
        .filter(|s| s.score >= config.threshold)
        .collect();
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(config.top_k);

    if candidates.is_empty() {
        SelectionOutcome::NoNegativeSentences
    } else {
        SelectionOutcome::Selected(candidates)
    }
}

/// Finds the most negative sentences of one speaker
pub struct NegativeSentenceSelector<'a> {
    sentiment: &'a LabelEndpoint,
    gateway: &'a InferenceGateway,
    config: SelectionConfig,
}

impl<'a> NegativeSentenceSelector<'a> {
    pub fn new(
        sentiment: &'a LabelEndpoint,
        gateway: &'a InferenceGateway,
        config: SelectionConfig,
    ) -> Self {
        Self {
            sentiment,
            gateway,
            config,
        }
    }

    /// Select up to `top_k` sentences of `speaker` at or above the threshold.
    ///
    /// A failed sentiment call scores the sentence 0.
    pub async fn select(&self, normalized_text: &str, speaker: SpeakerCode) -> SelectionOutcome {
        let sentences: Vec<String> = parse_normalized_text(normalized_text)
            .into_iter()
            .filter(|line| line.speaker == speaker)
            .map(|line| line.message)
            .collect();

        if sentences.is_empty() {
            info!("Speaker {} has no sentences", speaker);
            return SelectionOutcome::NoSpeakerSentences;
        }

        let outcomes = self.gateway.fan_out(self.sentiment, &sentences).await;
        let mut failures = 0usize;
        let scored: Vec<ScoredSentence> = sentences
            .into_iter()
            .zip(outcomes)
            .map(|(message, outcome)| {
                let score = match &outcome.result {
                    Ok(scores) => negativity(scores, &self.config.negative_label),
                    Err(_) => {
                        failures += 1;
                        0.0
                    }
                };
                debug!("Sentence {:?}: negativity {:.4}", message, score);
                ScoredSentence {
                    speaker,
                    message,
                    score,
                }
            })
            .collect();

        if failures > 0 {
            warn!("{} of {} sentiment calls failed", failures, scored.len());
        }

        let total = scored.len();
        let outcome = rank_sentences(scored, &self.config);
        match &outcome {
            SelectionOutcome::Selected(selected) => info!(
                "Selected {} of {} sentences for {} (threshold {})",
                selected.len(),
                total,
                speaker,
                self.config.threshold
            ),
            _ => info!("No sentence of {} reached {}", speaker, self.config.threshold),
        }
        outcome
    }

    /// Score every line of every speaker and report the raw model output
    pub async fn debug_sentiment(&self, normalized_text: &str) -> Vec<SentimentDebugEntry> {
        let lines = parse_normalized_text(normalized_text);
        let messages: Vec<&str> = lines.iter().map(|l| l.message.as_str()).collect();
        let outcomes = self.gateway.fan_out(self.sentiment, &messages).await;

        lines
            .into_iter()
            .zip(outcomes)
            .map(|(line, outcome)| {
                let model_output = outcome.result.ok();
                let negative_score = model_output
                    .as_deref()
                    .map(|scores| negativity(scores, &self.config.negative_label))
                    .unwrap_or(0.0);
                info!("Sentence {:?}: negativity {:.4}", line.message, negative_score);
                SentimentDebugEntry {
                    speaker: line.speaker,
                    message: line.message,
                    model_output,
                    negative_score,
                }
            })
            .collect()
    }
}
