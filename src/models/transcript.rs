use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One parsed line of an exported chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    /// Speaker name exactly as exported
    pub speaker: String,
    /// Message text (everything after the two bracketed fields)
    pub message: String,
    /// Position in the filtered line sequence
    pub order: usize,
}

/// Anonymized speaker alias (`u1`, `u2`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpeakerCode(u32);

impl SpeakerCode {
    /// Build the code for the n-th distinct speaker (1-based)
    pub fn new(ordinal: u32) -> Self {
        Self(ordinal)
    }

    pub fn ordinal(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SpeakerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// Error returned when a string is not of the form `u<digits>`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid speaker code: {0:?}")]
pub struct ParseSpeakerCodeError(pub String);

impl FromStr for SpeakerCode {
    type Err = ParseSpeakerCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Canonical form only: "u01" and "u0" are never assigned
        s.strip_prefix('u')
            .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
            .filter(|digits| !digits.starts_with('0'))
            .and_then(|digits| digits.parse::<u32>().ok())
            .map(SpeakerCode)
            .ok_or_else(|| ParseSpeakerCodeError(s.to_string()))
    }
}

impl Serialize for SpeakerCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpeakerCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An anonymized message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedLine {
    pub speaker: SpeakerCode,
    pub message: String,
}

/// Ordered speaker-code keyed table.
///
/// Entries stay in first-appearance order and serialize as a JSON object in
/// that order, so `u10` never sorts ahead of `u2`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerTable {
    entries: Vec<(SpeakerCode, String)>,
}

/// Code → original speaker name
pub type SpeakerMapping = SpeakerTable;
/// Code → every message of that speaker joined by single spaces
pub type ConversationMapping = SpeakerTable;

impl SpeakerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: SpeakerCode) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (SpeakerCode, &str)> {
        self.entries.iter().map(|(c, v)| (*c, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a new entry, or overwrite the value of an existing one
    pub fn insert(&mut self, code: SpeakerCode, value: String) {
        match self.entries.iter_mut().find(|(c, _)| *c == code) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((code, value)),
        }
    }

    /// Append `text` to the entry for `code`, separated by a single space.
    /// The first message for a code starts the string with no separator.
    pub fn append(&mut self, code: SpeakerCode, text: &str) {
        match self.entries.iter_mut().find(|(c, _)| *c == code) {
            Some((_, existing)) => {
                existing.push(' ');
                existing.push_str(text);
            }
            None => self.entries.push((code, text.to_string())),
        }
    }
}

impl Serialize for SpeakerTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (code, value) in &self.entries {
            map.serialize_entry(&code.to_string(), value)?;
        }
        map.end()
    }
}

/// How anonymized messages are rendered into the normalized text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RenderPolicy {
    /// One `"<code>: <message>"` line per original message
    #[default]
    PerMessage,
    /// Consecutive messages of one speaker form a run; only the first
    /// message of a run carries the `"<code>: "` prefix
    PerRun,
}

/// Output of transcript normalization
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationResult {
    pub normalized_text: String,
    pub speaker_mapping: SpeakerMapping,
    pub conversation_mapping: ConversationMapping,
    /// Anonymized messages in document order
    #[serde(skip)]
    pub lines: Vec<NormalizedLine>,
}

impl NormalizationResult {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
