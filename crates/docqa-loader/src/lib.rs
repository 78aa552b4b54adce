//! Document loading for uploads.
//!
//! The format is resolved once from the hint; PDFs become one segment per
//! page, plain text is split into pages on form feeds.
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use docqa_core::error::{Error, Result};
use docqa_core::traits::DocumentLoader;
use docqa_core::types::{Document, DocumentFormat, Segment};

const FORM_FEED: char = '\u{000C}';

#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self { Self }

    /// Read a file from disk and load it, using its name as the format hint.
    pub fn load_path(&self, path: &Path) -> Result<Document> {
        let bytes = fs::read(path).map_err(|e| Error::Load(format!("{}: {e}", path.display())))?;
        let name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| path.display().to_string());
        self.load(&bytes, &name)
    }
}

impl DocumentLoader for FileLoader {
    fn load(&self, bytes: &[u8], format_hint: &str) -> Result<Document> {
        let format = DocumentFormat::from_hint(format_hint)?;
        let segments = match format {
            DocumentFormat::Pdf => pdf_segments(bytes, format_hint)?,
            DocumentFormat::Text => text_segments(bytes, format_hint),
        };
        let document = Document::new(format_hint, format, bytes, segments);
        if document.is_blank() {
            return Err(Error::EmptyDocument);
        }
        info!(doc_id = %document.id, name = format_hint, %format, pages = document.segments.len(), "loaded document");
        Ok(document)
    }
}

/// Plain text pages. Invalid UTF-8 is replaced rather than rejected.
pub fn text_segments(bytes: &[u8], source: &str) -> Vec<Segment> {
    let text = String::from_utf8_lossy(bytes);
    text.split(FORM_FEED)
        .enumerate()
        .map(|(i, page)| Segment::page(source, i + 1, page))
        .collect()
}

pub fn pdf_segments(bytes: &[u8], source: &str) -> Result<Vec<Segment>> {
    // pdf-extract panics on some malformed inputs instead of returning an error.
    let extracted = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));
    let pages = match extracted {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => return Err(Error::Load(format!("{source}: {e}"))),
        Err(_) => {
            warn!(source, "pdf extraction panicked");
            return Err(Error::Load(format!("{source}: malformed PDF")));
        }
    };
    Ok(pages
        .into_iter()
        .enumerate()
        .map(|(i, page)| Segment::page(source, i + 1, page))
        .collect())
}
