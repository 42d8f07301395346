//! High-level search interface
//!
//! Combines embedder and store into a unified search API. The engine owns
//! its embedder, so chunks and queries are always encoded by the same model.
//!
//! # Usage
//!
//! ```ignore
//! use docchat_lib::search::SearchEngine;
//!
//! let mut engine = SearchEngine::new(embedder, MemoryStore::new());
//! engine.rebuild(&chunks)?;
//! let results = engine.search("What color is the sky?", 2)?;
//! ```

use tracing::{debug, info};

use crate::chunk::Chunk;
use crate::embed::Embedder;
use crate::store::{SearchResult, VectorStore};
use crate::Result;

/// High-level search engine combining embedding and storage.
pub struct SearchEngine<E: Embedder, S: VectorStore> {
    embedder: E,
    store: S,
}

impl<E: Embedder, S: VectorStore> SearchEngine<E, S> {
    /// Create a new search engine.
    #[must_use]
    pub fn new(embedder: E, store: S) -> Self {
        Self { embedder, store }
    }

    /// Index chunks by computing embeddings and storing them.
    pub fn index(&mut self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_documents(&texts)?;
        self.store.insert(chunks, &embeddings)?;

        debug!(count = chunks.len(), total = self.store.len(), "indexed chunks");
        Ok(())
    }

    /// Replace the whole index with `chunks`.
    ///
    /// The old entries are dropped before embedding starts, so a failed
    /// rebuild leaves an empty index rather than a stale one.
    pub fn rebuild(&mut self, chunks: &[Chunk]) -> Result<()> {
        self.store.clear();
        self.index(chunks)?;
        info!(
            chunks = self.store.len(),
            model = self.embedder.model_name(),
            "rebuilt index"
        );
        Ok(())
    }

    /// Search for the `k` chunks most similar to the query.
    pub fn search(&mut self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query_embedding = self.embedder.embed_query(query)?;
        self.store.search(&query_embedding, k)
    }

    /// Returns the number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` if no chunks are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}
