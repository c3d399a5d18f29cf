use tracing::info;

use crate::io::parse_transcript;
use crate::models::{
    ConversationMapping, NormalizationResult, NormalizedLine, RawLine, RenderPolicy, SpeakerCode,
    SpeakerMapping,
};

/// Assigns `u1`, `u2`, ... to raw speaker names in order of first appearance
#[derive(Debug, Default)]
pub struct SpeakerAnonymizer {
    /// Raw names indexed by `ordinal - 1`
    names: Vec<String>,
}

impl SpeakerAnonymizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Code for `name`, allocating the next one if the name is new
    pub fn assign(&mut self, name: &str) -> SpeakerCode {
        if let Some(pos) = self.names.iter().position(|n| n == name) {
            return SpeakerCode::new(pos as u32 + 1);
        }
        self.names.push(name.to_string());
        SpeakerCode::new(self.names.len() as u32)
    }

    /// Reverse lookup, code → raw name
    pub fn mapping(&self) -> SpeakerMapping {
        let mut mapping = SpeakerMapping::new();
        for (i, name) in self.names.iter().enumerate() {
            mapping.insert(SpeakerCode::new(i as u32 + 1), name.clone());
        }
        mapping
    }
}

/// Render anonymized lines as normalized text under `policy`
pub fn render_lines(lines: &[NormalizedLine], policy: RenderPolicy) -> String {
    let mut previous: Option<SpeakerCode> = None;
    let rendered: Vec<String> = lines
        .iter()
        .map(|line| {
            let starts_run = previous != Some(line.speaker);
            previous = Some(line.speaker);
            match policy {
                RenderPolicy::PerMessage => format!("{}: {}", line.speaker, line.message),
                RenderPolicy::PerRun if starts_run => {
                    format!("{}: {}", line.speaker, line.message)
                }
                // Continuation of a run: bare message, no code prefix
                RenderPolicy::PerRun => line.message.clone(),
            }
        })
        .collect();
    rendered.join("\n")
}

/// Anonymize parsed lines and render the normalized transcript
pub fn normalize_lines(raw: &[RawLine], policy: RenderPolicy) -> NormalizationResult {
    let mut anonymizer = SpeakerAnonymizer::new();
    let mut conversation = ConversationMapping::new();
    let mut lines = Vec::with_capacity(raw.len());

    for item in raw {
        let code = anonymizer.assign(&item.speaker);
        conversation.append(code, &item.message);
        lines.push(NormalizedLine {
            speaker: code,
            message: item.message.clone(),
        });
    }

    NormalizationResult {
        normalized_text: render_lines(&lines, policy),
        speaker_mapping: anonymizer.mapping(),
        conversation_mapping: conversation,
        lines,
    }
}

/// Perform Stage 0: parse, anonymize and render an exported chat.
///
/// Empty input or input without a single matching line yields an empty result.
pub fn normalize_transcript(text: &str, policy: RenderPolicy) -> NormalizationResult {
    let raw = parse_transcript(text);
    let result = normalize_lines(&raw, policy);
    info!(
        "Stage 0: {} messages from {} speakers",
        result.lines.len(),
        result.speaker_mapping.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "[Alice] [12:00] hi\n[Bob] [12:01] hello\n[Alice] [12:02] bye";

    #[test]
    fn test_normalize_sample() {
        let result = normalize_transcript(SAMPLE, RenderPolicy::PerMessage);

        assert_eq!(result.normalized_text, "u1: hi\nu2: hello\nu1: bye");
        assert_eq!(result.speaker_mapping.get(SpeakerCode::new(1)), Some("Alice"));
        assert_eq!(result.speaker_mapping.get(SpeakerCode::new(2)), Some("Bob"));
        assert_eq!(result.speaker_mapping.len(), 2);
        assert_eq!(result.conversation_mapping.get(SpeakerCode::new(1)), Some("hi bye"));
        assert_eq!(result.conversation_mapping.get(SpeakerCode::new(2)), Some("hello"));
    }

    #[test]
    fn test_codes_follow_first_appearance() {
        let text = "[Zed] [1] a\n[Amy] [2] b\n[Zed] [3] c\n[Max] [4] d\n[Amy] [5] e";
        let result = normalize_transcript(text, RenderPolicy::PerMessage);

        let names: Vec<_> = result.speaker_mapping.iter().collect();
        assert_eq!(
            names,
            vec![
                (SpeakerCode::new(1), "Zed"),
                (SpeakerCode::new(2), "Amy"),
                (SpeakerCode::new(3), "Max"),
            ]
        );
    }

    #[test]
    fn test_mapping_is_bijective() {
        let text = "[A] [1] x\n[B] [1] x\n[A] [1] x\n[C] [1] x\n[B] [1] x";
        let result = normalize_transcript(text, RenderPolicy::PerMessage);

        let mut names: Vec<_> = result.speaker_mapping.iter().map(|(_, n)| n).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), result.speaker_mapping.len());
    }

    #[test]
    fn test_lines_concatenate_to_normalized_text() {
        let text = "[A] [1] one\n[A] [2] two\n[B] [3] three\n[A] [4] four";
        let result = normalize_transcript(text, RenderPolicy::PerMessage);

        let rebuilt: Vec<String> = result
            .lines
            .iter()
            .map(|l| format!("{}: {}", l.speaker, l.message))
            .collect();
        assert_eq!(rebuilt.join("\n"), result.normalized_text);
        assert_eq!(result.lines.len(), 4);
    }

    #[test]
    fn test_per_run_policy() {
        let text = "[A] [1] one\n[A] [2] two\n[B] [3] three\n[A] [4] four";
        let result = normalize_transcript(text, RenderPolicy::PerRun);

        assert_eq!(result.normalized_text, "u1: one\ntwo\nu2: three\nu1: four");
    }

    #[test]
    fn test_empty_input() {
        let result = normalize_transcript("", RenderPolicy::PerMessage);
        assert!(result.is_empty());
        assert_eq!(result.normalized_text, "");
        assert!(result.speaker_mapping.is_empty());
        assert!(result.conversation_mapping.is_empty());

        let result = normalize_transcript("garbage\n---------------", RenderPolicy::PerMessage);
        assert!(result.is_empty());
    }

    #[test]
    fn test_anonymizer_reuses_codes() {
        let mut anonymizer = SpeakerAnonymizer::new();
        assert_eq!(anonymizer.assign("x"), SpeakerCode::new(1));
        assert_eq!(anonymizer.assign("y"), SpeakerCode::new(2));
        assert_eq!(anonymizer.assign("x"), SpeakerCode::new(1));
    }
}
