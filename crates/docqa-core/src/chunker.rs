//! Recursive character chunker.
//!
//! Each segment is cut into spans of at most `max_size` chars. A span ends at
//! the latest paragraph break that fits, else the latest line break, sentence
//! end or space, else at exactly `max_size` chars. Every span after the first
//! starts `overlap` chars before the previous one ended, so dropping the first
//! `overlap` chars of each later span reconstructs the segment.
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Chunk, Document, Segment};

/// Split points in order of preference. Cuts fall after the separator.
const SEPARATORS: [&str; 6] = ["\n\n", "\n", ". ", "! ", "? ", " "];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length in chars.
    pub max_size: usize,
    /// Chars repeated from the end of the previous chunk.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_size: 1000, overlap: 200 }
    }
}

impl ChunkingConfig {
    pub fn new(max_size: usize, overlap: usize) -> Result<Self> {
        let config = Self { max_size, overlap };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::InvalidConfig("chunking.max_size must be > 0".to_string()));
        }
        if self.overlap >= self.max_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunking.max_size ({})",
                self.overlap, self.max_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ChunkingConfig {
        self.config
    }

    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        self.chunk_segments(&document.id, &document.segments)
    }

    /// Chunk segments in order. Chunk indices run across the whole document;
    /// overlap never crosses a segment boundary. Blank segments yield nothing.
    pub fn chunk_segments(&self, doc_id: &str, segments: &[Segment]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for (segment_index, segment) in segments.iter().enumerate() {
            if segment.text.trim().is_empty() {
                continue;
            }
            for (offset, content) in split_text(&segment.text, self.config.max_size, self.config.overlap) {
                let chunk_index = chunks.len();
                chunks.push(Chunk {
                    id: format!("{doc_id}:{chunk_index}"),
                    doc_id: doc_id.to_string(),
                    source: segment.meta.source.clone(),
                    page: segment.meta.page,
                    segment_index,
                    offset,
                    chunk_index,
                    content,
                });
            }
        }
        debug!(doc_id, segments = segments.len(), chunks = chunks.len(), "chunked document");
        chunks
    }
}

/// Split `text` into `(char_offset, span)` pairs.
///
/// Requires `overlap < max_size`; callers go through [`ChunkingConfig::validate`].
pub fn split_text(text: &str, max_size: usize, overlap: usize) -> Vec<(usize, String)> {
    // Byte offset of every char boundary, including the end of the string.
    let bounds: Vec<usize> = text.char_indices().map(|(b, _)| b).chain(std::iter::once(text.len())).collect();
    let len = bounds.len() - 1;
    let mut spans = Vec::new();
    if len == 0 || max_size == 0 || overlap >= max_size {
        return spans;
    }

    let mut start = 0usize;
    loop {
        if len - start <= max_size {
            spans.push((start, text[bounds[start]..].to_string()));
            break;
        }
        let limit = start + max_size;
        let end = preferred_cut(text, &bounds, start + overlap + 1, limit).unwrap_or(limit);
        spans.push((start, text[bounds[start]..bounds[end]].to_string()));
        start = end - overlap;
    }
    spans
}

/// Latest cut point in `[lo, hi]` (char positions) after the most preferred
/// separator that has one.
///
/// Only the window around `[lo, hi]` is searched, so each cut costs
/// `O(max_size)` regardless of how far into the segment it falls.
fn preferred_cut(text: &str, bounds: &[usize], lo: usize, hi: usize) -> Option<usize> {
    // Separators are at most two chars, so one ending at `lo` starts no earlier than `lo - 2`.
    let from = bounds[lo.saturating_sub(2)];
    let window = &text[from..bounds[hi]];
    SEPARATORS.iter().find_map(|sep| {
        let cut_byte = from + window.rfind(sep)? + sep.len();
        let cut = bounds.binary_search(&cut_byte).ok()?;
        (cut >= lo).then_some(cut)
    })
}
