//! Error types for docchat

use thiserror::Error;

/// Result type alias for docchat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in docchat operations
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load or run the embedding model
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Failed to chunk a document
    #[error("chunking error: {0}")]
    Chunking(String),

    /// Failed to store or retrieve from vector store
    #[error("store error: {0}")]
    Store(String),

    /// Document or chunk not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// File extension has no loader
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A document could not be read at all
    #[error("extraction error: {0}")]
    Extraction(String),

    /// The generative model failed or returned garbage
    #[error("generation error: {0}")]
    Generation(String),

    /// Configuration could not be parsed or is inconsistent
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
