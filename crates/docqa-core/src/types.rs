//! Domain types shared by the loader, chunker, index and orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

pub type ChunkId = String;

/// Supported upload formats. Resolved once at the loader boundary; anything
/// that is not a PDF or plain text never becomes a `DocumentFormat`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    /// Resolve a format from a file name, bare extension or MIME type.
    ///
    /// Accepts `report.PDF`, `.txt`, `txt`, `application/pdf`, `text/plain`.
    /// MIME parameters such as `; charset=utf-8` are ignored.
    pub fn from_hint(hint: &str) -> Result<Self> {
        let hint = hint.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match hint.as_str() {
            "application/pdf" => return Ok(Self::Pdf),
            "text/plain" => return Ok(Self::Text),
            _ => {}
        }
        let ext = hint.rsplit('.').next().unwrap_or_default();
        match ext {
            "pdf" => Ok(Self::Pdf),
            "txt" | "text" => Ok(Self::Text),
            _ => Err(Error::UnsupportedFormat(hint)),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "txt",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Where a segment came from inside its document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SegmentMeta {
    /// Original file name (or format hint) of the upload.
    pub source: String,
    /// 1-based page number when the format has pages.
    pub page: Option<usize>,
}

/// A raw text segment produced by a loader, typically one page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub meta: SegmentMeta,
}

impl Segment {
    pub fn page(source: &str, page: usize, text: impl Into<String>) -> Self {
        Self { text: text.into(), meta: SegmentMeta { source: source.to_string(), page: Some(page) } }
    }
}

/// An uploaded document after loading. Immutable; consumed by the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Content hash of the raw bytes, stable across uploads of the same file.
    pub id: String,
    pub name: String,
    pub format: DocumentFormat,
    pub segments: Vec<Segment>,
}

impl Document {
    pub fn new(name: &str, format: DocumentFormat, raw: &[u8], segments: Vec<Segment>) -> Self {
        Self { id: content_id(raw), name: name.to_string(), format, segments }
    }

    /// True when no segment carries any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.segments.iter().all(|s| s.text.trim().is_empty())
    }
}

/// Short BLAKE3 digest used as a document identity.
pub fn content_id(raw: &[u8]) -> String {
    let hex = blake3::hash(raw).to_hex();
    hex.as_str()[..16].to_string()
}

/// A bounded span of a segment, the unit of retrieval.
///
/// - `id`: `{doc_id}:{chunk_index}`
/// - `segment_index`/`page`: which segment the span was cut from
/// - `offset`: char offset of the span inside that segment
/// - `chunk_index`: position within the whole document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub source: String,
    pub page: Option<usize>,
    pub segment_index: usize,
    pub offset: usize,
    pub chunk_index: usize,
    pub content: String,
}

/// A retrieved chunk with its similarity to the query. Higher is better.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub id: ChunkId,
    pub chunk_index: usize,
    pub page: Option<usize>,
    pub content: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged message sent to a language model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A completed question/answer exchange.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}
