//! Bounded conversation memory.
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use docqa_core::types::{ChatMessage, Turn};

pub const MAX_HISTORY_LENGTH: usize = 5;

/// Chronological log of the most recent turns. Oldest turns are evicted
/// first once more than `cap` turns have been appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: VecDeque<Turn>,
    cap: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new(MAX_HISTORY_LENGTH)
    }
}

impl ConversationHistory {
    pub fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self { turns: VecDeque::with_capacity(cap + 1), cap }
    }

    pub fn append(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push_back(Turn { question: question.into(), answer: answer.into() });
        while self.turns.len() > self.cap {
            self.turns.pop_front();
        }
    }

    /// Copy of this history with one more turn; `self` is untouched.
    pub fn appended(&self, question: impl Into<String>, answer: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.append(question, answer);
        next
    }

    /// Role-tagged messages, oldest turn first.
    pub fn condense(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .flat_map(|t| [ChatMessage::user(t.question.as_str()), ChatMessage::assistant(t.answer.as_str())])
            .collect()
    }

    /// Plain-text transcript, oldest turn first.
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("Human: {}\nAssistant: {}", t.question, t.answer))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn last(&self) -> Option<&Turn> { self.turns.back() }
    pub fn len(&self) -> usize { self.turns.len() }
    pub fn is_empty(&self) -> bool { self.turns.is_empty() }
    pub fn cap(&self) -> usize { self.cap }
    pub fn clear(&mut self) { self.turns.clear(); }
}
