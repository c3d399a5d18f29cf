use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{LabelScore, SpeakerCode};

/// A sentence of one speaker with its negativity value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredSentence {
    pub speaker: SpeakerCode,
    pub message: String,
    /// Score of the negative label, in [0, 1]
    pub score: f64,
}

/// Tone used when asking for a rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackStyle {
    /// Gentle, sympathetic wording
    Empathetic,
    /// Blunt, direct wording
    Blunt,
}

impl fmt::Display for FeedbackStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedbackStyle::Empathetic => f.write_str("empathetic"),
            FeedbackStyle::Blunt => f.write_str("blunt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown feedback style {0:?} (expected empathetic or blunt)")]
pub struct ParseFeedbackStyleError(pub String);

impl FromStr for FeedbackStyle {
    type Err = ParseFeedbackStyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "empathetic" | "empathy" | "공감" => Ok(FeedbackStyle::Empathetic),
            "blunt" | "direct" | "팩폭" => Ok(FeedbackStyle::Blunt),
            other => Err(ParseFeedbackStyleError(other.to_string())),
        }
    }
}

/// How much of a rewrite reply could be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteStatus {
    /// Both sections parsed
    Complete,
    /// One section missing
    Partial,
    /// Call failed or neither section parsed
    Failed,
}

/// One finished suggestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackItem {
    /// 1-based rank by descending negativity
    pub rank: usize,
    pub original: String,
    pub improvement: String,
    pub rewritten: String,
    pub score: f64,
    pub status: RewriteStatus,
}

/// Result of negative sentence selection
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// The requested speaker has no lines in the transcript
    NoSpeakerSentences,
    /// The speaker has lines but none reached the threshold
    NoNegativeSentences,
    /// Ranked, truncated candidates (never empty)
    Selected(Vec<ScoredSentence>),
}

/// Result of the feedback flow
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeedbackOutcome {
    Feedback { feedback: Vec<FeedbackItem> },
    Message { message: String },
}

impl FeedbackOutcome {
    pub fn no_speaker_sentences(speaker: SpeakerCode) -> Self {
        FeedbackOutcome::Message {
            message: format!("speaker {} has no sentences", speaker),
        }
    }

    pub fn no_negative_sentences(speaker: SpeakerCode) -> Self {
        FeedbackOutcome::Message {
            message: format!("speaker {} has no negative sentences", speaker),
        }
    }

    pub fn items(&self) -> &[FeedbackItem] {
        match self {
            FeedbackOutcome::Feedback { feedback } => feedback,
            FeedbackOutcome::Message { .. } => &[],
        }
    }
}

/// Per-line sentiment dump used for threshold tuning
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentDebugEntry {
    pub speaker: SpeakerCode,
    pub message: String,
    /// Raw model output, absent when the call failed
    pub model_output: Option<Vec<LabelScore>>,
    pub negative_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_aliases() {
        assert_eq!("공감".parse::<FeedbackStyle>(), Ok(FeedbackStyle::Empathetic));
        assert_eq!("팩폭".parse::<FeedbackStyle>(), Ok(FeedbackStyle::Blunt));
        assert_eq!(" Blunt ".parse::<FeedbackStyle>(), Ok(FeedbackStyle::Blunt));
        assert!("sarcastic".parse::<FeedbackStyle>().is_err());
    }

    #[test]
    fn test_message_outcome_serialization() {
        let outcome = FeedbackOutcome::no_negative_sentences(SpeakerCode::new(1));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["message"], "speaker u1 has no negative sentences");
        assert!(outcome.items().is_empty());
    }
}
