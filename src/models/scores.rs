use serde::{Deserialize, Serialize};

/// One `{label, score}` pair from a text-classification endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

impl LabelScore {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// Output of the intimacy regressor for one chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RegressionOutput {
    #[serde(default)]
    pub raw_score: f64,
    #[serde(default)]
    pub scaled_score: f64,
}

/// Immutable label code → display name table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    entries: Vec<(String, String)>,
    unknown: String,
}

impl LabelMap {
    /// Build a map from ordered `(code, display)` pairs
    pub fn new<I, C, D>(entries: I, unknown: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (C, D)>,
        C: Into<String>,
        D: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(c, d)| (c.into(), d.into()))
                .collect(),
            unknown: unknown.into(),
        }
    }

    /// Label codes in table order
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(c, _)| c.as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.iter().any(|(c, _)| c == code)
    }

    /// Display name for a code, or the unknown category
    pub fn display(&self, code: &str) -> &str {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, d)| d.as_str())
            .unwrap_or(&self.unknown)
    }

    pub fn unknown(&self) -> &str {
        &self.unknown
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LabelMap {
    /// The six relationship categories of the relationship classifier
    fn default() -> Self {
        Self::new(
            [
                ("LABEL_0", "family"),
                ("LABEL_1", "other"),
                ("LABEL_2", "stranger"),
                ("LABEL_3", "romantic"),
                ("LABEL_4", "work"),
                ("LABEL_5", "friend"),
            ],
            "unknown",
        )
    }
}

/// Running per-label sum of chunk winner scores.
///
/// Every label of the map is present from construction, starting at 0.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScoreAccumulator {
    totals: Vec<LabelScore>,
}

impl LabelScoreAccumulator {
    pub fn new(labels: &LabelMap) -> Self {
        Self {
            totals: labels.codes().map(|c| LabelScore::new(c, 0.0)).collect(),
        }
    }

    /// Add `score` to `label`. Returns false when the label is not tracked.
    pub fn add(&mut self, label: &str, score: f64) -> bool {
        match self.totals.iter_mut().find(|t| t.label == label) {
            Some(total) => {
                total.score += score;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, label: &str) -> Option<f64> {
        self.totals.iter().find(|t| t.label == label).map(|t| t.score)
    }

    /// Label with the greatest cumulative score; the earliest label wins ties
    pub fn best(&self) -> Option<&LabelScore> {
        first_max(&self.totals)
    }

    pub fn totals(&self) -> &[LabelScore] {
        &self.totals
    }

    pub fn into_totals(self) -> Vec<LabelScore> {
        self.totals
    }
}

/// Highest-scoring item under strict `>`: among equal maxima the first seen wins
pub fn first_max(items: &[LabelScore]) -> Option<&LabelScore> {
    let mut iter = items.iter();
    let mut top = iter.next()?;
    for item in iter {
        // Strict: an equal score never displaces the earlier item
        if item.score > top.score {
            top = item;
        }
    }
    Some(top)
}

/// Aggregated relationship classification
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationSummary {
    /// Winning label code, if any chunk contributed
    pub label_code: Option<String>,
    /// Display name of the winner (or the unknown category)
    pub relationship: String,
    /// Cumulative score per label, in label map order
    pub label_scores: Vec<LabelScore>,
    pub chunks_total: usize,
    pub chunks_contributing: usize,
    pub chunks_failed: usize,
    /// Chunks whose top label is not in the label map
    pub chunks_unmapped: usize,
    /// True when any chunk failed or the stream itself could not be chunked
    pub degraded: bool,
}

/// Aggregated intimacy regression
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionSummary {
    pub raw_score: f64,
    pub scaled_score: f64,
    pub chunks_total: usize,
    pub chunks_failed: usize,
    pub degraded: bool,
}
