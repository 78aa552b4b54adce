//! The retrieval-augmented question answering loop.
use tracing::{debug, info};

use docqa_core::config::{HistoryMode, Settings};
use docqa_core::error::{Error, Result};
use docqa_core::traits::{Embedder, LanguageModel};
use docqa_core::types::SearchHit;
use docqa_vector::{VectorIndex, DEFAULT_TOP_K};

use crate::memory::ConversationHistory;
use crate::prompt;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// The question actually embedded for retrieval.
    pub standalone_question: String,
    /// Retrieved passages, best first.
    pub sources: Vec<SearchHit>,
}

pub struct RagChain<E, L>
where
    E: Embedder,
    L: LanguageModel,
{
    embedder: E,
    llm: L,
    top_k: usize,
    history_mode: HistoryMode,
    retry: RetryPolicy,
}

impl<E, L> RagChain<E, L>
where
    E: Embedder,
    L: LanguageModel,
{
    pub fn new(embedder: E, llm: L) -> Self {
        Self { embedder, llm, top_k: DEFAULT_TOP_K, history_mode: HistoryMode::default(), retry: RetryPolicy::default() }
    }

    pub fn from_settings(embedder: E, llm: L, settings: &Settings) -> Self {
        Self::new(embedder, llm)
            .with_top_k(settings.retrieval.top_k)
            .with_history_mode(settings.rag.history_mode)
            .with_retry(RetryPolicy::from_settings(&settings.gateway))
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self { self.top_k = top_k.max(1); self }
    pub fn with_history_mode(mut self, mode: HistoryMode) -> Self { self.history_mode = mode; self }
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self { self.retry = retry; self }

    pub fn embedder(&self) -> &E { &self.embedder }
    pub fn top_k(&self) -> usize { self.top_k }
    pub fn history_mode(&self) -> HistoryMode { self.history_mode }

    /// Answer `question` against `index`, grounded in both the retrieved
    /// passages and `history`.
    ///
    /// Returns the answer and `history` with the new turn appended. On any
    /// error the caller's history is untouched; nothing is appended unless
    /// generation succeeded. Without an index no gateway is called.
    pub fn answer(
        &self,
        question: &str,
        history: &ConversationHistory,
        index: Option<&VectorIndex>,
    ) -> Result<(Answer, ConversationHistory)> {
        let index = index.ok_or(Error::NotReady)?;
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::InvalidInput("question is empty".to_string()));
        }

        let standalone = self.standalone_question(question, history)?;
        let query = self.retry.run("embed", || self.embedder.embed(&standalone))?;
        let sources = index.retrieve(&query, self.top_k)?;

        let messages = prompt::answer_messages(&sources, history, question);
        debug!(messages = messages.len(), context_chars = messages[0].content.len(), "assembled prompt");
        let text = self.retry.run("generate", || self.llm.generate(&messages))?.trim().to_string();
        if text.is_empty() {
            return Err(Error::Generation("model returned an empty answer".to_string()));
        }

        let updated = history.appended(question, text.as_str());
        info!(
            sources = sources.len(),
            top_score = sources.first().map(|h| h.score),
            history = updated.len(),
            "answered question"
        );
        Ok((Answer { text, standalone_question: standalone, sources }, updated))
    }

    fn standalone_question(&self, question: &str, history: &ConversationHistory) -> Result<String> {
        if history.is_empty() || self.history_mode == HistoryMode::Messages {
            return Ok(question.to_string());
        }
        let messages = prompt::condense_messages(history, question);
        let rephrased = self.retry.run("condense", || self.llm.generate(&messages))?;
        let rephrased = rephrased.trim();
        debug!(question, rephrased, "condensed follow-up");
        if rephrased.is_empty() {
            return Ok(question.to_string());
        }
        Ok(rephrased.to_string())
    }
}
