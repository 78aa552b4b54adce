//! Conversational retrieval-augmented question answering over one document.
//!
//! A [`Session`] owns the index built from the latest upload and the bounded
//! [`ConversationHistory`]; a [`RagChain`] holds the injected gateways and
//! turns a question plus that state into an [`Answer`].
pub mod chain;
pub mod memory;
pub mod prompt;
pub mod retry;
pub mod session;

pub use chain::{Answer, RagChain};
pub use memory::{ConversationHistory, MAX_HISTORY_LENGTH};
pub use retry::RetryPolicy;
pub use session::{DocumentInfo, Session};
