#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, LanguageModel};
use docqa_core::types::{ChatMessage, Role};
use docqa_embed::FakeEmbedder;
use docqa_rag::prompt::CONDENSE_INSTRUCTION;

pub const PETS: &[u8] = b"Cats are mammals.\x0cDogs are mammals too.";

/// FakeEmbedder that counts calls and can fail a scripted number of times.
pub struct CountingEmbedder {
    inner: FakeEmbedder,
    pub calls: AtomicUsize,
    failures_left: AtomicUsize,
}

impl CountingEmbedder {
    pub fn new() -> Self { Self::failing(0) }

    pub fn failing(times: usize) -> Self {
        Self { inner: FakeEmbedder::new(1024), calls: AtomicUsize::new(0), failures_left: AtomicUsize::new(times) }
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    pub fn fail_next(&self, times: usize) { self.failures_left.store(times, Ordering::SeqCst); }
}

impl Embedder for CountingEmbedder {
    fn dim(&self) -> usize { self.inner.dim() }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(Error::Embedding("connection reset".to_string()));
        }
        self.inner.embed_batch(texts)
    }
}

/// Language model that rewrites "what about X?" follow-ups and answers with
/// the top-ranked context passage. Records every request.
pub struct ScriptedModel {
    pub requests: Mutex<Vec<Vec<ChatMessage>>>,
    failures_left: AtomicUsize,
}

impl ScriptedModel {
    pub fn new() -> Self { Self::failing(0) }

    pub fn failing(times: usize) -> Self {
        Self { requests: Mutex::new(Vec::new()), failures_left: AtomicUsize::new(times) }
    }

    pub fn calls(&self) -> usize { self.requests.lock().unwrap().len() }

    pub fn fail_next(&self, times: usize) { self.failures_left.store(times, Ordering::SeqCst); }

    pub fn condense_requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().iter().filter(|m| is_condense(m)).cloned().collect()
    }

    pub fn last_request(&self) -> Vec<ChatMessage> {
        self.requests.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

fn is_condense(messages: &[ChatMessage]) -> bool {
    messages.first().map(|m| m.content == CONDENSE_INSTRUCTION).unwrap_or(false)
}

impl LanguageModel for ScriptedModel {
    fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(Error::Generation("rate limited".to_string()));
        }

        if is_condense(messages) {
            let prompt = &messages[1].content;
            let follow_up = prompt
                .lines()
                .find_map(|l| l.strip_prefix("Follow-up question: "))
                .unwrap_or_default();
            let lower = follow_up.to_lowercase();
            return Ok(match lower.strip_prefix("what about ") {
                Some(subject) => format!("What are {}", subject),
                None => follow_up.to_string(),
            });
        }

        let system = messages.iter().find(|m| m.role == Role::System).map(|m| m.content.as_str()).unwrap_or_default();
        let top = system
            .lines()
            .find_map(|l| l.strip_prefix("[1] "))
            .map(|l| match l.strip_prefix('(').and_then(|rest| rest.split_once(") ")) {
                Some((_page, passage)) => passage,
                None => l,
            })
            .unwrap_or("nothing relevant");
        Ok(format!("According to the document: {top}"))
    }
}
