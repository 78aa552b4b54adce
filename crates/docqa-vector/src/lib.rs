//! In-memory vector index for a single uploaded document.
pub mod index;
pub mod similarity;

pub use index::{IndexEntry, VectorIndex, DEFAULT_BATCH_SIZE, DEFAULT_TOP_K};
pub use similarity::{cosine_similarity, Metric};
