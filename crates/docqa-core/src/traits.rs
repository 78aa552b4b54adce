//! Capability interfaces for the external collaborators.
//!
//! Gateways are injected into the orchestrator explicitly; nothing in the
//! workspace holds a process-wide client.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{ChatMessage, Document};

/// Maps text to a fixed-length vector.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;

    /// Embed every input; the output has one vector per input, in order.
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| Error::Embedding("gateway returned no vector".to_string()))
    }
}

/// Produces text from a role-tagged conversation.
pub trait LanguageModel: Send + Sync {
    fn generate(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Turns raw upload bytes into text segments.
pub trait DocumentLoader: Send + Sync {
    /// `format_hint` is a file name, extension or MIME type.
    fn load(&self, bytes: &[u8], format_hint: &str) -> Result<Document>;
}

impl<T: Embedder + ?Sized> Embedder for &T {
    fn dim(&self) -> usize { (**self).dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { (**self).embed_batch(texts) }
}

impl<T: Embedder + ?Sized> Embedder for Box<T> {
    fn dim(&self) -> usize { (**self).dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { (**self).embed_batch(texts) }
}

impl<T: Embedder + ?Sized> Embedder for Arc<T> {
    fn dim(&self) -> usize { (**self).dim() }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { (**self).embed_batch(texts) }
}

impl<T: LanguageModel + ?Sized> LanguageModel for &T {
    fn generate(&self, messages: &[ChatMessage]) -> Result<String> { (**self).generate(messages) }
}

impl<T: LanguageModel + ?Sized> LanguageModel for Box<T> {
    fn generate(&self, messages: &[ChatMessage]) -> Result<String> { (**self).generate(messages) }
}

impl<T: LanguageModel + ?Sized> LanguageModel for Arc<T> {
    fn generate(&self, messages: &[ChatMessage]) -> Result<String> { (**self).generate(messages) }
}
