pub mod chunker;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use chunker::{Chunker, ChunkingConfig};
pub use error::{Error, Result};
