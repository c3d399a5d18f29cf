use tracing::{info, warn};

use crate::llm::{REWRITE_SENTINEL, RewriteService, build_rewrite_prompt, parse_rewrite_reply};
use crate::models::{FeedbackItem, FeedbackStyle, RewriteStatus, ScoredSentence};

/// Configuration for the rewrite stage
#[derive(Debug, Clone)]
pub struct RewriteConfig {
    pub style: FeedbackStyle,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            style: FeedbackStyle::Empathetic,
        }
    }
}

/// Turns selected sentences into styled suggestions
pub struct RewriteOrchestrator<'a> {
    service: &'a dyn RewriteService,
    config: RewriteConfig,
}

impl<'a> RewriteOrchestrator<'a> {
    pub fn new(service: &'a dyn RewriteService, config: RewriteConfig) -> Self {
        Self { service, config }
    }

    /// Rewrite each sentence in rank order, one call at a time.
    ///
    /// A failed call or unparseable reply fills the affected fields with
    /// `REWRITE_SENTINEL`; the remaining sentences are still processed.
    pub async fn rewrite_all(&self, selected: &[ScoredSentence]) -> Vec<FeedbackItem> {
        info!(
            "Rewriting {} sentences ({} style)",
            selected.len(),
            self.config.style
        );

        let mut items = Vec::with_capacity(selected.len());
        for (i, sentence) in selected.iter().enumerate() {
            items.push(self.rewrite_one(i + 1, sentence).await);
        }
        items
    }

    async fn rewrite_one(&self, rank: usize, sentence: &ScoredSentence) -> FeedbackItem {
        let prompt = build_rewrite_prompt(&sentence.message, self.config.style);

        let (improvement, rewritten, status) = match self.service.complete(&prompt).await {
            Ok(reply) => {
                let parsed = parse_rewrite_reply(&reply, &sentence.message);
                let status = if parsed.is_complete() {
                    RewriteStatus::Complete
                } else if parsed.is_empty() {
                    warn!("Rank {}: reply had neither section: {:?}", rank, reply);
                    RewriteStatus::Failed
                } else {
                    warn!("Rank {}: reply is missing a section", rank);
                    RewriteStatus::Partial
                };
                (parsed.improvement, parsed.rewritten, status)
            }
            Err(e) => {
                warn!("Rank {}: rewrite call failed: {}", rank, e);
                (None, None, RewriteStatus::Failed)
            }
        };

        FeedbackItem {
            rank,
            original: sentence.message.clone(),
            improvement: improvement.unwrap_or_else(|| REWRITE_SENTINEL.to_string()),
            rewritten: rewritten.unwrap_or_else(|| REWRITE_SENTINEL.to_string()),
            score: sentence.score,
            status,
        }
    }
}
