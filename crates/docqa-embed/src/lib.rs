//! Embedding gateways.
//!
//! `get_default_embedder` returns the HTTP gateway configured in settings, or
//! the deterministic `FakeEmbedder` when `APP_USE_FAKE_EMBEDDINGS=1`.
use std::hash::Hasher;

use tracing::info;
use twox_hash::XxHash64;

use docqa_core::config::GatewaySettings;
use docqa_core::error::Result;
pub use docqa_core::traits::Embedder;

pub mod openai;
pub mod pool;

pub use openai::OpenAiEmbedder;
pub use pool::l2_normalize;

/// Hashed bag-of-words embedder. Same text, same vector; texts sharing more
/// lowercase word tokens score higher under cosine similarity.
#[derive(Debug, Clone)]
pub struct FakeEmbedder { dim: usize }

impl FakeEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in tokens(text) {
            let mut hasher = XxHash64::with_seed(0);
            hasher.write(token.as_bytes());
            let idx = (hasher.finish() % self.dim as u64) as usize;
            v[idx] += 1.0;
        }
        l2_normalize(&mut v);
        v
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

impl Embedder for FakeEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

pub fn get_default_embedder(settings: &GatewaySettings) -> Result<Box<dyn Embedder>> {
    if use_fake_embeddings() {
        info!(dim = settings.embedding_dim, "using FakeEmbedder");
        return Ok(Box::new(FakeEmbedder::new(settings.embedding_dim)));
    }
    let embedder = OpenAiEmbedder::from_settings(settings)?;
    info!(model = embedder.model(), url = %settings.base_url, "using HTTP embedder");
    Ok(Box::new(embedder))
}
