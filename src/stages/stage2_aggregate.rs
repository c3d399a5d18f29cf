use tracing::{info, warn};

use crate::models::{
    ChunkOutcome, ClassificationSummary, LabelMap, LabelScore, LabelScoreAccumulator,
    RegressionOutput, RegressionSummary, first_max,
};

/// How a failed chunk enters a mean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Failed chunks add 0 and still count in the denominator
    #[default]
    ContributeZero,
    /// Failed chunks are left out of the mean
    Exclude,
}

/// Configuration for Stage 2
#[derive(Debug, Clone, Default)]
pub struct AggregationConfig {
    /// Label code → relationship category table
    pub labels: LabelMap,
    /// Treatment of failed regression chunks
    pub regression_failures: FailurePolicy,
}

/// Folds per-chunk inference results into one answer per stream
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    config: AggregationConfig,
}

impl ScoreAggregator {
    pub fn new(config: AggregationConfig) -> Self {
        Self { config }
    }

    pub fn labels(&self) -> &LabelMap {
        &self.config.labels
    }

    /// Cumulative-score argmax over chunk classifier outputs.
    ///
    /// Each chunk votes for its top label with that label's score. Ties are
    /// won by the earlier item, both inside a chunk and across labels.
    /// `stream_failed` marks a stream that could not be chunked at all.
    pub fn classify(
        &self,
        outcomes: &[ChunkOutcome<Vec<LabelScore>>],
        stream_failed: bool,
    ) -> ClassificationSummary {
        let labels = &self.config.labels;
        let mut accumulator = LabelScoreAccumulator::new(labels);
        let mut contributing = 0usize;
        let mut failed = 0usize;
        let mut unmapped = 0usize;

        for outcome in outcomes {
            let scores = match &outcome.result {
                Ok(scores) => scores,
                Err(_) => {
                    failed += 1;
                    continue;
                }
            };
            // One vote per chunk: its top label, first-seen on ties
            let Some(top) = first_max(scores) else {
                warn!("Chunk {}: classifier returned no labels", outcome.index);
                unmapped += 1;
                continue;
            };
            if accumulator.add(&top.label, top.score) {
                contributing += 1;
            } else {
                warn!("Chunk {}: unmapped label {:?}", outcome.index, top.label);
                unmapped += 1;
            }
        }

        // All totals are still 0 when nothing contributed; first_max would
        // then pick the first label, so fall back to unknown instead
        let label_code = if contributing > 0 {
            accumulator.best().map(|best| best.label.clone())
        } else {
            None
        };
        let relationship = match &label_code {
            Some(code) => labels.display(code).to_string(),
            None => labels.unknown().to_string(),
        };

        info!(
            "Stage 2: label scores {:?}, best {:?} ({} contributing, {} failed, {} unmapped)",
            accumulator.totals(),
            label_code,
            contributing,
            failed,
            unmapped
        );

        ClassificationSummary {
            label_code,
            relationship,
            label_scores: accumulator.into_totals(),
            chunks_total: outcomes.len(),
            chunks_contributing: contributing,
            chunks_failed: failed,
            chunks_unmapped: unmapped,
            degraded: stream_failed || failed > 0,
        }
    }

    /// Arithmetic mean of raw and scaled scores; zero chunks average to 0
    pub fn average(
        &self,
        outcomes: &[ChunkOutcome<RegressionOutput>],
        stream_failed: bool,
    ) -> RegressionSummary {
        let mut sum_raw = 0.0;
        let mut sum_scaled = 0.0;
        let mut failed = 0usize;

        for outcome in outcomes {
            match &outcome.result {
                Ok(output) => {
                    sum_raw += output.raw_score;
                    sum_scaled += output.scaled_score;
                }
                Err(_) => failed += 1,
            }
        }

        // Exclude can leave 0 when every chunk failed
        let denominator = match self.config.regression_failures {
            FailurePolicy::ContributeZero => outcomes.len(),
            FailurePolicy::Exclude => outcomes.len() - failed,
        };
        let (raw_score, scaled_score) = if denominator == 0 {
            (0.0, 0.0)
        } else {
            (sum_raw / denominator as f64, sum_scaled / denominator as f64)
        };

        info!(
            "Stage 2: intimacy raw {:.4}, scaled {:.4} over {} chunks ({} failed)",
            raw_score,
            scaled_score,
            outcomes.len(),
            failed
        );

        RegressionSummary {
            raw_score,
            scaled_score,
            chunks_total: outcomes.len(),
            chunks_failed: failed,
            degraded: stream_failed || failed > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::InferenceError;

    fn ok<T>(index: usize, value: T) -> ChunkOutcome<T> {
        ChunkOutcome {
            index,
            result: Ok(value),
        }
    }

    fn failed<T>(index: usize) -> ChunkOutcome<T> {
        ChunkOutcome {
            index,
            result: Err(InferenceError::Http {
                endpoint: "classifier".to_string(),
                status: 500,
                body: "internal".to_string(),
            }),
        }
    }

    fn scores(pairs: &[(&str, f64)]) -> Vec<LabelScore> {
        pairs.iter().map(|(l, s)| LabelScore::new(*l, *s)).collect()
    }

    fn abc() -> ScoreAggregator {
        ScoreAggregator::new(AggregationConfig {
            labels: LabelMap::new([("A", "alpha"), ("B", "beta"), ("C", "gamma")], "unknown"),
            ..Default::default()
        })
    }

    #[test]
    fn test_first_seen_wins_exact_tie() {
        let outcomes = vec![
            ok(0, scores(&[("A", 0.9), ("B", 0.05), ("C", 0.05)])),
            ok(1, scores(&[("B", 0.9), ("A", 0.05), ("C", 0.05)])),
            ok(2, scores(&[("C", 0.1), ("A", 0.05), ("B", 0.05)])),
        ];

        let summary = abc().classify(&outcomes, false);

        assert_eq!(summary.label_code.as_deref(), Some("A"));
        assert_eq!(summary.relationship, "alpha");
        assert_eq!(summary.chunks_contributing, 3);
        assert!(!summary.degraded);
    }

    #[test]
    fn test_top_label_tie_inside_chunk() {
        let outcomes = vec![ok(0, scores(&[("B", 0.5), ("A", 0.5)]))];
        let summary = abc().classify(&outcomes, false);
        assert_eq!(summary.label_code.as_deref(), Some("B"));
    }

    #[test]
    fn test_cumulative_beats_single_high() {
        let outcomes = vec![
            ok(0, scores(&[("A", 0.95), ("C", 0.05)])),
            ok(1, scores(&[("C", 0.6), ("A", 0.4)])),
            ok(2, scores(&[("C", 0.6), ("A", 0.4)])),
        ];
        let summary = abc().classify(&outcomes, false);
        assert_eq!(summary.label_code.as_deref(), Some("C"));
        let c = summary.label_scores.iter().find(|s| s.label == "C").unwrap();
        assert!((c.score - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_failed_chunk_is_skipped() {
        let outcomes = vec![
            ok(0, scores(&[("B", 0.7), ("A", 0.3)])),
            failed(1),
            ok(2, scores(&[("B", 0.6), ("A", 0.4)])),
        ];

        let summary = abc().classify(&outcomes, false);

        assert_eq!(summary.label_code.as_deref(), Some("B"));
        assert_eq!(summary.chunks_failed, 1);
        assert_eq!(summary.chunks_contributing, 2);
        assert!(summary.degraded);
    }

    #[test]
    fn test_unmapped_label_resolves_to_unknown() {
        let outcomes = vec![ok(0, scores(&[("Z", 0.99), ("A", 0.01)]))];

        let summary = abc().classify(&outcomes, false);

        assert_eq!(summary.label_code, None);
        assert_eq!(summary.relationship, "unknown");
        assert_eq!(summary.chunks_unmapped, 1);
        assert_eq!(summary.label_scores.len(), 3);
    }

    #[test]
    fn test_no_chunks_is_unknown() {
        let summary = ScoreAggregator::default().classify(&[], true);
        assert_eq!(summary.relationship, "unknown");
        assert_eq!(summary.label_scores.len(), 6);
        assert!(summary.degraded);
    }

    #[test]
    fn test_average_zero_chunks() {
        let summary = ScoreAggregator::default().average(&[], false);
        assert_eq!(summary.raw_score, 0.0);
        assert_eq!(summary.scaled_score, 0.0);
        assert!(!summary.degraded);
    }

    #[test]
    fn test_average() {
        let outcomes = vec![
            ok(0, RegressionOutput { raw_score: 1.0, scaled_score: 60.0 }),
            ok(1, RegressionOutput { raw_score: 2.0, scaled_score: 80.0 }),
        ];
        let summary = ScoreAggregator::default().average(&outcomes, false);
        assert_eq!(summary.raw_score, 1.5);
        assert_eq!(summary.scaled_score, 70.0);
    }

    #[test]
    fn test_average_failure_policies() {
        let outcomes = vec![
            ok(0, RegressionOutput { raw_score: 3.0, scaled_score: 90.0 }),
            failed(1),
        ];

        let zero = ScoreAggregator::default().average(&outcomes, false);
        assert_eq!(zero.raw_score, 1.5);
        assert_eq!(zero.scaled_score, 45.0);
        assert!(zero.degraded);

        let exclude = ScoreAggregator::new(AggregationConfig {
            regression_failures: FailurePolicy::Exclude,
            ..Default::default()
        })
        .average(&outcomes, false);
        assert_eq!(exclude.raw_score, 3.0);
        assert_eq!(exclude.scaled_score, 90.0);

        let all_failed = vec![failed::<RegressionOutput>(0)];
        let summary = ScoreAggregator::new(AggregationConfig {
            regression_failures: FailurePolicy::Exclude,
            ..Default::default()
        })
        .average(&all_failed, false);
        assert_eq!(summary.raw_score, 0.0);
    }
}
