use tracing::{debug, info};

use crate::inference::{InferenceError, Tokenizer};
use crate::models::{Chunk, ChunkStream, TokenSpan};

/// Configuration for chunking one stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// Maximum tokens per chunk
    pub max_tokens: usize,
    /// Tokens each chunk repeats from the end of its predecessor
    pub overlap_tokens: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            overlap_tokens: 50,
        }
    }
}

impl ChunkConfig {
    pub fn new(max_tokens: usize, overlap_tokens: usize) -> Self {
        Self {
            max_tokens,
            overlap_tokens,
        }
    }

    /// `max_tokens` of at least 1, overlap strictly below it
    fn effective(&self) -> (usize, usize) {
        let max = self.max_tokens.max(1);
        (max, self.overlap_tokens.min(max - 1))
    }
}

/// Cuts text into token-bounded, overlapping chunks.
///
/// Token positions come from the injected tokenizer; this type only decides
/// where to cut. Identical inputs always produce identical chunks.
pub struct Chunker<'a> {
    tokenizer: &'a dyn Tokenizer,
}

impl<'a> Chunker<'a> {
    pub fn new(tokenizer: &'a dyn Tokenizer) -> Self {
        Self { tokenizer }
    }

    /// Chunk `text` and return only the fragment texts
    pub async fn chunk(
        &self,
        text: &str,
        max_tokens: usize,
        overlap_tokens: usize,
    ) -> Result<Vec<String>, InferenceError> {
        let chunks = self
            .chunk_stream(
                text,
                &ChunkConfig::new(max_tokens, overlap_tokens),
                ChunkStream::Classification,
            )
            .await?;
        Ok(chunks.into_iter().map(|c| c.text).collect())
    }

    /// Chunk `text` for one inference stream
    pub async fn chunk_stream(
        &self,
        text: &str,
        config: &ChunkConfig,
        stream: ChunkStream,
    ) -> Result<Vec<Chunk>, InferenceError> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        let spans = self.tokenizer.token_spans(text).await?;
        let chunks = slice_chunks(text, &spans, config, stream)?;
        info!(
            "Stage 1: {} tokens -> {} {} chunks (max {}, overlap {})",
            spans.len(),
            chunks.len(),
            stream.as_str(),
            config.max_tokens,
            config.overlap_tokens
        );
        Ok(chunks)
    }
}

/// Cut `text` at token boundaries.
///
/// A chunk covering tokens `[a, b)` runs from the start of token `a` (byte 0
/// for the first chunk) to the start of token `b` (end of text for the last
/// chunk), so whitespace between tokens is never lost.
pub fn slice_chunks(
    text: &str,
    spans: &[TokenSpan],
    config: &ChunkConfig,
    stream: ChunkStream,
) -> Result<Vec<Chunk>, InferenceError> {
    validate_spans(text, spans)?;

    let n = spans.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let (max, overlap) = config.effective();
    // Byte offset where token k begins. The ends are pinned to the text edges
    // so leading/trailing whitespace stays in the first/last chunk.
    let boundary = |k: usize| -> usize {
        if k == 0 {
            0
        } else if k >= n {
            text.len()
        } else {
            spans[k].start
        }
    };

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut start = 0usize;
    let mut previous_to = 0usize;

    loop {
        // Token range [start, end) of this chunk
        let end = (start + max).min(n);
        let from = boundary(start);
        let to = boundary(end);
        let slice = text.get(from..to).ok_or_else(|| InferenceError::InvalidInput {
            message: format!("chunk bytes {}..{} are not on character boundaries", from, to),
        })?;

        // Bytes at the head of this chunk already covered by the previous one
        let overlap_bytes = if chunks.is_empty() {
            0
        } else {
            previous_to.saturating_sub(from)
        };
        chunks.push(Chunk {
            index: chunks.len(),
            text: slice.to_string(),
            stream,
            token_range: start..end,
            overlap_bytes,
        });
        debug!("Chunk {}: tokens {}..{}", chunks.len() - 1, start, end);

        if end == n {
            break;
        }
        previous_to = to;
        // overlap < max, so start always moves forward
        start = end - overlap;
    }

    Ok(chunks)
}

fn validate_spans(text: &str, spans: &[TokenSpan]) -> Result<(), InferenceError> {
    let mut last_start = 0usize;
    for (i, span) in spans.iter().enumerate() {
        let in_bounds = span.start <= span.end && span.end <= text.len();
        let on_boundary = text.is_char_boundary(span.start) && text.is_char_boundary(span.end);
        // Spans must be sorted; overlapping ends are tolerated
        if !in_bounds || !on_boundary || span.start < last_start {
            return Err(InferenceError::InvalidInput {
                message: format!(
                    "token {} span {}..{} is invalid for text of {} bytes",
                    i,
                    span.start,
                    span.end,
                    text.len()
                ),
            });
        }
        last_start = span.start;
    }
    Ok(())
}
