use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::inference::InferenceError;

/// Byte offsets of one token inside the text it was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpan {
    pub start: usize,
    pub end: usize,
}

impl TokenSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Which inference stream a chunk was cut for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStream {
    Classification,
    Regression,
}

impl ChunkStream {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkStream::Classification => "classification",
            ChunkStream::Regression => "regression",
        }
    }
}

/// A token-bounded slice of the normalized transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position of this chunk in its stream
    pub index: usize,
    /// Text sent to the endpoint
    pub text: String,
    /// Stream this chunk belongs to
    pub stream: ChunkStream,
    /// Token indices covered by this chunk
    pub token_range: Range<usize>,
    /// Leading bytes of `text` already contained in the previous chunk
    pub overlap_bytes: usize,
}

impl Chunk {
    pub fn token_count(&self) -> usize {
        self.token_range.len()
    }

    /// The part of this chunk not shared with its predecessor
    pub fn fresh_text(&self) -> &str {
        self.text.get(self.overlap_bytes..).unwrap_or("")
    }
}

/// Rebuild the source text from an ordered chunk sequence
pub fn reconstruct(chunks: &[Chunk]) -> String {
    chunks.iter().map(Chunk::fresh_text).collect()
}

/// Per-chunk result of a fan-out call
#[derive(Debug)]
pub struct ChunkOutcome<T> {
    /// Index of the input this outcome belongs to
    pub index: usize,
    pub result: Result<T, InferenceError>,
}

impl<T> ChunkOutcome<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, overlap_bytes: usize) -> Chunk {
        Chunk {
            index: 0,
            text: text.to_string(),
            stream: ChunkStream::Classification,
            token_range: 0..1,
            overlap_bytes,
        }
    }

    #[test]
    fn test_reconstruct_drops_overlap() {
        let chunks = vec![chunk("a b c ", 0), chunk("c d e", 2)];
        assert_eq!(reconstruct(&chunks), "a b c d e");
    }

    #[test]
    fn test_fresh_text_out_of_range_is_empty() {
        assert_eq!(chunk("ab", 5).fresh_text(), "");
    }
}
