use std::sync::LazyLock;

use regex::Regex;

/// Value used for a section that could not be obtained
pub const REWRITE_SENTINEL: &str = "[unavailable]";

/// Label of the explanation section, with markdown bold allowed around it
const IMPROVEMENT_PATTERN: &str =
    r"\*{0,2}\s*(?:improvements?(?:\s+explanation)?|개선\s*점|개선\s*사항)\s*\*{0,2}\s*:";
/// Label of the rewritten-sentence section
const REWRITTEN_PATTERN: &str =
    r"\*{0,2}\s*(?:rewritten(?:\s+sentence)?|수정(?:된)?\s*문장)\s*\*{0,2}\s*:";
/// A section ends at a blank line, at the other section's label, or at the end
const BLANK_LINE: &str = r"\r?\n[ \t]*\r?\n";

static IMPROVEMENT_SECTION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is){IMPROVEMENT_PATTERN}\s*\*{{0,2}}\s*(?P<improvement>.*?)\s*(?:{BLANK_LINE}|{REWRITTEN_PATTERN}|\z)"
    ))
    .ok()
});

static REWRITTEN_SECTION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?is){REWRITTEN_PATTERN}\s*\*{{0,2}}\s*(?P<rewritten>.*?)\s*(?:{BLANK_LINE}|{IMPROVEMENT_PATTERN}|\z)"
    ))
    .ok()
});

/// Sections recovered from a rewrite reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRewrite {
    pub improvement: Option<String>,
    pub rewritten: Option<String>,
}

impl ParsedRewrite {
    pub fn is_complete(&self) -> bool {
        self.improvement.is_some() && self.rewritten.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.improvement.is_none() && self.rewritten.is_none()
    }
}

/// Extract the two labeled sections from a free-text reply.
///
/// Tolerates markdown bold around labels, label case, and quotes around the
/// rewritten sentence. A rewritten sentence identical to `original` counts
/// as missing.
pub fn parse_rewrite_reply(reply: &str, original: &str) -> ParsedRewrite {
    let improvement = capture(&IMPROVEMENT_SECTION, reply, "improvement");
    let rewritten = capture(&REWRITTEN_SECTION, reply, "rewritten")
        .filter(|text| text.trim() != original.trim());

    ParsedRewrite {
        improvement,
        rewritten,
    }
}

fn capture(pattern: &LazyLock<Option<Regex>>, reply: &str, group: &str) -> Option<String> {
    let regex = pattern.as_ref()?;
    let caps = regex.captures(reply)?;
    let text = caps.name(group)?.as_str();
    let cleaned = strip_quotes(text.trim()).trim();
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

fn strip_quotes(text: &str) -> &str {
    const QUOTES: [(char, char); 3] = [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')];
    for (open, close) in QUOTES {
        if let Some(inner) = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner;
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_template() {
        let reply = "Improvement: It sounds accusatory.\nRewritten: Could we try to be on time next week?";
        let parsed = parse_rewrite_reply(reply, "why are you always late");

        assert_eq!(parsed.improvement.as_deref(), Some("It sounds accusatory."));
        assert_eq!(
            parsed.rewritten.as_deref(),
            Some("Could we try to be on time next week?")
        );
        assert!(parsed.is_complete());
    }

    #[test]
    fn test_markdown_labels_and_quotes() {
        let reply = "**Improvement:** Soften it.\n\n**Rewritten:** \"I was worried when you were late.\"";
        let parsed = parse_rewrite_reply(reply, "you're late again");

        assert_eq!(parsed.improvement.as_deref(), Some("Soften it."));
        assert_eq!(
            parsed.rewritten.as_deref(),
            Some("I was worried when you were late.")
        );
    }

    #[test]
    fn test_multiline_improvement() {
        let reply = "improvement: first point\nsecond point\nREWRITTEN SENTENCE: new text";
        let parsed = parse_rewrite_reply(reply, "old text");

        assert_eq!(parsed.improvement.as_deref(), Some("first point\nsecond point"));
        assert_eq!(parsed.rewritten.as_deref(), Some("new text"));
    }

    #[test]
    fn test_missing_section() {
        let parsed = parse_rewrite_reply("Improvement: be kinder", "x");
        assert_eq!(parsed.improvement.as_deref(), Some("be kinder"));
        assert_eq!(parsed.rewritten, None);
        assert!(!parsed.is_complete());
    }

    #[test]
    fn test_unstructured_reply() {
        let parsed = parse_rewrite_reply("Sorry, I can't help with that.", "x");
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_reversed_section_order() {
        let parsed = parse_rewrite_reply("Rewritten: please stop\nImprovement: be softer", "stop it");
        assert_eq!(parsed.rewritten.as_deref(), Some("please stop"));
        assert_eq!(parsed.improvement.as_deref(), Some("be softer"));
    }

    #[test]
    fn test_trailing_commentary_is_dropped() {
        let reply = "Improvement: be softer\nRewritten: please stop\n\nLet me know if you need more help!";
        let parsed = parse_rewrite_reply(reply, "stop it");
        assert_eq!(parsed.improvement.as_deref(), Some("be softer"));
        assert_eq!(parsed.rewritten.as_deref(), Some("please stop"));
    }

    #[test]
    fn test_plural_improvement_label() {
        let parsed = parse_rewrite_reply("Improvements: fewer absolutes\nRewritten: I felt ignored.", "you never listen");
        assert_eq!(parsed.improvement.as_deref(), Some("fewer absolutes"));
        assert!(parsed.is_complete());
    }

    #[test]
    fn test_korean_labels() {
        let reply = "개선점: 상대를 탓하는 표현을 줄이세요.\n수정된 문장: 오늘 좀 서운했어.";
        let parsed = parse_rewrite_reply(reply, "넌 맨날 왜 그래");
        assert_eq!(parsed.improvement.as_deref(), Some("상대를 탓하는 표현을 줄이세요."));
        assert_eq!(parsed.rewritten.as_deref(), Some("오늘 좀 서운했어."));
    }

    #[test]
    fn test_verbatim_rewrite_is_rejected() {
        let reply = "Improvement: fine as is\nRewritten: \"leave me alone\"";
        let parsed = parse_rewrite_reply(reply, "leave me alone");
        assert_eq!(parsed.rewritten, None);
        assert!(parsed.improvement.is_some());
    }
}
