use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, SearchHit};

use crate::similarity::Metric;

pub const DEFAULT_TOP_K: usize = 4;
pub const DEFAULT_BATCH_SIZE: usize = 64;

#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// Immutable in-memory index over one document's chunks.
///
/// Only `build` constructs one, and it either embeds every chunk or returns
/// an error, so a partially embedded index cannot exist.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    doc_id: String,
    dim: usize,
    metric: Metric,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn build<E: Embedder + ?Sized>(chunks: Vec<Chunk>, embedder: &E) -> Result<Self> {
        Self::build_with_progress(chunks, embedder, DEFAULT_BATCH_SIZE, &ProgressBar::hidden())
    }

    pub fn build_with_progress<E: Embedder + ?Sized>(
        chunks: Vec<Chunk>,
        embedder: &E,
        batch_size: usize,
        pb: &ProgressBar,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(Error::EmptyDocument);
        }
        let dim = embedder.dim();
        let batch_size = batch_size.max(1);
        let doc_id = chunks[0].doc_id.clone();

        pb.set_length(chunks.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let embedded = embedder.embed_batch(&texts)?;
            if embedded.len() != batch.len() {
                return Err(Error::Embedding(format!("expected {} vectors, got {}", batch.len(), embedded.len())));
            }
            for (chunk, vector) in batch.iter().zip(&embedded) {
                if vector.len() != dim {
                    return Err(Error::Embedding(format!("chunk {} has dim {}, expected {dim}", chunk.id, vector.len())));
                }
                if vector.iter().any(|x| !x.is_finite()) {
                    return Err(Error::Embedding(format!("chunk {} has non-finite values", chunk.id)));
                }
            }
            vectors.extend(embedded);
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("indexed");

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexEntry { chunk, vector })
            .collect();
        info!(doc_id = %doc_id, chunks = entries.len(), dim, "built vector index");
        Ok(Self { doc_id, dim, metric: Metric::Cosine, entries })
    }

    /// Top `k` chunks by similarity, best first. Equal scores keep chunk order.
    pub fn retrieve(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if query.len() != self.dim {
            return Err(Error::InvalidInput(format!("query has dim {}, index has dim {}", query.len(), self.dim)));
        }
        let mut hits: Vec<SearchHit> = self
            .entries
            .iter()
            .map(|e| SearchHit {
                id: e.chunk.id.clone(),
                chunk_index: e.chunk.chunk_index,
                page: e.chunk.page,
                content: e.chunk.content.clone(),
                score: self.metric.score(&e.vector, query),
            })
            .collect();
        // sort_by is stable, so ties stay in insertion (chunk) order.
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        debug!(k, scores = ?hits.iter().map(|h| h.score).collect::<Vec<_>>(), "retrieved");
        Ok(hits)
    }

    pub fn doc_id(&self) -> &str { &self.doc_id }
    pub fn dim(&self) -> usize { self.dim }
    pub fn metric(&self) -> Metric { self.metric }
    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
    pub fn entries(&self) -> &[IndexEntry] { &self.entries }
}
