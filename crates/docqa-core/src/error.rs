use thiserror::Error;

/// Everything that can go wrong between an upload and an answer.
///
/// `Embedding` and `Generation` are upstream failures: they come from an
/// external gateway, may succeed on retry, and never mutate session state.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported format: {0} (expected pdf or txt)")]
    UnsupportedFormat(String),

    #[error("Failed to load document: {0}")]
    Load(String),

    #[error("Document contains no extractable text")]
    EmptyDocument,

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("No document has been processed yet")]
    NotReady,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// True for failures raised by an external gateway call.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Error::Embedding(_) | Error::Generation(_))
    }

    pub fn is_retryable(&self) -> bool {
        self.is_upstream()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
