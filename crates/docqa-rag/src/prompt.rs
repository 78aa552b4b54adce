//! Prompt assembly for the condense and answer steps.
use docqa_core::types::{ChatMessage, SearchHit};

use crate::memory::ConversationHistory;

pub const CONDENSE_INSTRUCTION: &str = "Rewrite the follow-up question as a standalone question that can be \
understood without the conversation. Resolve pronouns and references such as \"it\" or \"what about\" using the \
conversation. Reply with the rewritten question only.";

pub const ANSWER_INSTRUCTION: &str = "You answer questions about an uploaded document. Use the context passages \
and the conversation so far. If the context does not contain the answer, say that you don't know instead of \
guessing.";

/// Messages asking the model to turn `question` into a standalone question.
pub fn condense_messages(history: &ConversationHistory, question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(CONDENSE_INSTRUCTION),
        ChatMessage::user(format!(
            "Conversation:\n{}\n\nFollow-up question: {question}\nStandalone question:",
            history.transcript()
        )),
    ]
}

/// Passages in rank order, numbered from 1.
pub fn format_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| match hit.page {
            Some(page) => format!("[{}] (page {page}) {}", i + 1, hit.content.trim()),
            None => format!("[{}] {}", i + 1, hit.content.trim()),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// System instruction with context, then prior turns oldest first, then the question.
pub fn answer_messages(hits: &[SearchHit], history: &ConversationHistory, question: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 2);
    messages.push(ChatMessage::system(format!("{ANSWER_INSTRUCTION}\n\nContext:\n{}", format_context(hits))));
    messages.extend(history.condense());
    messages.push(ChatMessage::user(question));
    messages
}
