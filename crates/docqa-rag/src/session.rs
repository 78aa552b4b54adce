//! Per-user session state: at most one index and its conversation.
use std::sync::Arc;

use indicatif::ProgressBar;
use serde::Serialize;
use tracing::info;

use docqa_core::config::Settings;
use docqa_core::error::{Error, Result};
use docqa_core::traits::{DocumentLoader, Embedder, LanguageModel};
use docqa_core::types::DocumentFormat;
use docqa_core::Chunker;
use docqa_vector::{VectorIndex, DEFAULT_BATCH_SIZE};

use crate::chain::{Answer, RagChain};
use crate::memory::{ConversationHistory, MAX_HISTORY_LENGTH};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 200 * 1024 * 1024;

/// What the session currently answers questions about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub id: String,
    pub name: String,
    pub format: DocumentFormat,
    pub pages: usize,
    pub chunks: usize,
}

/// Owns the index and history for one conversation. Questions take
/// `&mut self`, so two questions can never race on the history.
#[derive(Debug)]
pub struct Session {
    chunker: Chunker,
    max_upload_bytes: usize,
    index: Option<Arc<VectorIndex>>,
    document: Option<DocumentInfo>,
    history: ConversationHistory,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Chunker::default(), MAX_HISTORY_LENGTH, DEFAULT_MAX_UPLOAD_BYTES)
    }
}

impl Session {
    pub fn new(chunker: Chunker, max_history: usize, max_upload_bytes: usize) -> Self {
        Self { chunker, max_upload_bytes, index: None, document: None, history: ConversationHistory::new(max_history) }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::new(Chunker::new(settings.chunking)?, settings.memory.max_history, settings.upload.max_bytes))
    }

    pub fn process_upload<D, E>(&mut self, loader: &D, embedder: &E, bytes: &[u8], name: &str) -> Result<&DocumentInfo>
    where
        D: DocumentLoader + ?Sized,
        E: Embedder + ?Sized,
    {
        self.process_upload_with_progress(loader, embedder, bytes, name, &ProgressBar::hidden())
    }

    /// Load, chunk and index an upload, then make it the session's document.
    ///
    /// The previous index and history survive any failure; on success the
    /// index is replaced wholesale and the history cleared.
    pub fn process_upload_with_progress<D, E>(
        &mut self,
        loader: &D,
        embedder: &E,
        bytes: &[u8],
        name: &str,
        pb: &ProgressBar,
    ) -> Result<&DocumentInfo>
    where
        D: DocumentLoader + ?Sized,
        E: Embedder + ?Sized,
    {
        if bytes.len() > self.max_upload_bytes {
            return Err(Error::InvalidInput(format!(
                "upload is {} bytes, limit is {}",
                bytes.len(),
                self.max_upload_bytes
            )));
        }
        let document = loader.load(bytes, name)?;
        let chunks = self.chunker.chunk_document(&document);
        let chunk_count = chunks.len();
        let index = VectorIndex::build_with_progress(chunks, embedder, DEFAULT_BATCH_SIZE, pb)?;

        let info = DocumentInfo {
            id: document.id,
            name: document.name,
            format: document.format,
            pages: document.segments.len(),
            chunks: chunk_count,
        };
        info!(doc_id = %info.id, name = %info.name, chunks = info.chunks, "session document replaced");
        self.index = Some(Arc::new(index));
        self.history.clear();
        Ok(&*self.document.insert(info))
    }

    /// Answer through `chain`, committing the new turn only on success.
    pub fn ask<E, L>(&mut self, chain: &RagChain<E, L>, question: &str) -> Result<Answer>
    where
        E: Embedder,
        L: LanguageModel,
    {
        let (answer, updated) = chain.answer(question, &self.history, self.index.as_deref())?;
        self.history = updated;
        Ok(answer)
    }

    pub fn is_ready(&self) -> bool { self.index.is_some() }
    pub fn index(&self) -> Option<Arc<VectorIndex>> { self.index.clone() }
    pub fn document(&self) -> Option<&DocumentInfo> { self.document.as_ref() }
    pub fn history(&self) -> &ConversationHistory { &self.history }
    pub fn reset_history(&mut self) { self.history.clear(); }
}
