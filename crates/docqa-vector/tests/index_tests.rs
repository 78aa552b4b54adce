use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use docqa_core::error::{Error, Result};
use docqa_core::traits::Embedder;
use docqa_core::types::Chunk;
use docqa_embed::FakeEmbedder;
use docqa_vector::{VectorIndex, DEFAULT_TOP_K};

fn chunk(i: usize, content: &str) -> Chunk {
    Chunk {
        id: format!("doc:{i}"),
        doc_id: "doc".to_string(),
        source: "doc.txt".to_string(),
        page: Some(1),
        segment_index: 0,
        offset: 0,
        chunk_index: i,
        content: content.to_string(),
    }
}

/// Embeds text as a fixed 2-d vector looked up from the first word.
struct AxisEmbedder;

impl Embedder for AxisEmbedder {
    fn dim(&self) -> usize { 2 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| match t.split_whitespace().next() {
            Some("x") => vec![1.0, 0.0],
            Some("y") => vec![0.0, 1.0],
            Some("xy") => vec![1.0, 1.0],
            _ => vec![0.0, 0.0],
        }).collect())
    }
}

/// Fails on the call that would embed chunk number `fail_at`.
struct FailingEmbedder { fail_at: usize, seen: AtomicUsize }

impl Embedder for FailingEmbedder {
    fn dim(&self) -> usize { 4 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let start = self.seen.fetch_add(texts.len(), Ordering::SeqCst);
        if start + texts.len() > self.fail_at {
            return Err(Error::Embedding("quota exceeded".to_string()));
        }
        Ok(texts.iter().map(|_| vec![0.5; 4]).collect())
    }
}

struct WrongDim;

impl Embedder for WrongDim {
    fn dim(&self) -> usize { 3 }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
    }
}

#[test]
fn ranks_by_cosine_descending() {
    let chunks = vec![chunk(0, "y north"), chunk(1, "xy diagonal"), chunk(2, "x east")];
    let index = VectorIndex::build(chunks, &AxisEmbedder).unwrap();
    let hits = index.retrieve(&[1.0, 0.0], 3).unwrap();
    let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ids, vec!["doc:2", "doc:1", "doc:0"]);
    assert!((hits[0].score - 1.0).abs() < 1e-6);
    assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn ties_keep_chunk_order() {
    let chunks = vec![chunk(0, "x one"), chunk(1, "y two"), chunk(2, "x three"), chunk(3, "x four")];
    let index = VectorIndex::build(chunks, &AxisEmbedder).unwrap();
    let hits = index.retrieve(&[1.0, 0.0], 3).unwrap();
    let order: Vec<_> = hits.iter().map(|h| h.chunk_index).collect();
    assert_eq!(order, vec![0, 2, 3]);
}

#[test]
fn retrieval_is_deterministic() {
    let embedder = FakeEmbedder::new(128);
    let texts = ["alpha beta", "beta gamma", "gamma delta", "delta alpha", "beta beta"];
    let chunks = texts.iter().enumerate().map(|(i, t)| chunk(i, t)).collect();
    let index = VectorIndex::build(chunks, &embedder).unwrap();
    let query = embedder.embed("beta").unwrap();
    let first = index.retrieve(&query, DEFAULT_TOP_K).unwrap();
    for _ in 0..10 {
        assert_eq!(index.retrieve(&query, DEFAULT_TOP_K).unwrap(), first);
    }
    assert_eq!(first.len(), 4);
}

#[test]
fn k_larger_than_index_returns_everything() {
    let index = VectorIndex::build(vec![chunk(0, "x"), chunk(1, "y")], &AxisEmbedder).unwrap();
    assert_eq!(index.retrieve(&[0.0, 1.0], 10).unwrap().len(), 2);
    assert!(index.retrieve(&[0.0, 1.0], 0).unwrap().is_empty());
}

#[test]
fn embedding_failure_aborts_the_whole_build() {
    let chunks: Vec<Chunk> = (0..10).map(|i| chunk(i, "text")).collect();
    let embedder = FailingEmbedder { fail_at: 7, seen: AtomicUsize::new(0) };
    let result = VectorIndex::build_with_progress(chunks, &embedder, 3, &indicatif::ProgressBar::hidden());
    assert!(matches!(result, Err(Error::Embedding(_))));
}

#[test]
fn wrong_dimension_is_an_embedding_error() {
    let result = VectorIndex::build(vec![chunk(0, "x")], &WrongDim);
    assert!(matches!(result, Err(Error::Embedding(_))));
}

#[test]
fn empty_chunk_list_cannot_be_indexed() {
    assert!(matches!(VectorIndex::build(vec![], &AxisEmbedder), Err(Error::EmptyDocument)));
}

#[test]
fn query_dimension_must_match() {
    let index = VectorIndex::build(vec![chunk(0, "x")], &AxisEmbedder).unwrap();
    assert!(matches!(index.retrieve(&[1.0, 0.0, 0.0], 1), Err(Error::InvalidInput(_))));
}

#[test]
fn concurrent_reads_agree() {
    let embedder = FakeEmbedder::new(64);
    let chunks = (0..20).map(|i| chunk(i, &format!("token{i} shared words"))).collect();
    let index = Arc::new(VectorIndex::build(chunks, &embedder).unwrap());
    let query = embedder.embed("token7 shared").unwrap();
    let expected = index.retrieve(&query, 4).unwrap();

    let handles: Vec<_> = (0..4).map(|_| {
        let index = Arc::clone(&index);
        let query = query.clone();
        std::thread::spawn(move || index.retrieve(&query, 4).unwrap())
    }).collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
