//! Text embedding using local models
//!
//! Uses sentence-transformers/all-MiniLM-L6-v2 via the fastembed crate (ONNX
//! runtime).
//!
//! # Model Details
//!
//! - Dimensions: 384
//! - Max tokens: 256
//!
//! The same embedder instance must be used to index a document set and to
//! embed the queries run against it; vectors from different models are not
//! comparable.
//!
//! # Usage
//!
//! ```ignore
//! use docchat_lib::embed::{Embedder, MiniLmEmbedder};
//!
//! let mut embedder = MiniLmEmbedder::new(true)?;
//!
//! // Embed documents (for indexing)
//! let doc_embeddings = embedder.embed_documents(&["Quarterly report...", "Meeting notes..."])?;
//!
//! // Embed query (for searching)
//! let query_embedding = embedder.embed_query("What was the revenue?")?;
//! ```

use crate::Result;

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
pub trait Embedder: Send + Sync {
    /// Embed multiple documents for indexing
    ///
    /// Documents may be batched for efficiency.
    fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for searching
    fn embed_query(&mut self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

mod minilm;
pub use minilm::*;
