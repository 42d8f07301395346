use std::cmp::Ordering;

use crate::chunk::Chunk;
use crate::embed::Embedding;
use crate::store::{SearchResult, VectorStore};
use crate::{Error, Result};

/// In-memory vector store.
///
/// Uses brute-force cosine similarity search, which is plenty for the
/// handful of documents a chat session works with. Every stored vector and
/// every query must share one dimension; the first insert fixes it.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<(Chunk, Embedding)>,
    dimension: Option<usize>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from scratch out of matching chunks and embeddings.
    pub fn build(chunks: &[Chunk], embeddings: &[Embedding]) -> Result<Self> {
        let mut store = Self::new();
        store.insert(chunks, embeddings)?;
        Ok(store)
    }

    /// Dimension of the stored vectors, if anything has been stored.
    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn check_dimension(&self, expected: usize, actual: usize) -> Result<()> {
        if expected != actual {
            return Err(Error::Store(format!(
                "embedding dimension {actual} does not match index dimension {expected}"
            )));
        }
        Ok(())
    }
}

impl VectorStore for MemoryStore {
    fn insert(&mut self, chunks: &[Chunk], embeddings: &[Embedding]) -> Result<()> {
        if chunks.len() != embeddings.len() {
            return Err(Error::InvalidInput(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        // validate everything before touching the store
        let dimension = self
            .dimension
            .or_else(|| embeddings.first().map(Vec::len));
        if let Some(dimension) = dimension {
            for embedding in embeddings {
                self.check_dimension(dimension, embedding.len())?;
            }
        }

        self.dimension = dimension;
        self.entries
            .extend(chunks.iter().cloned().zip(embeddings.iter().cloned()));
        Ok(())
    }

    fn search(&self, query: &Embedding, k: usize) -> Result<Vec<SearchResult>> {
        let Some(dimension) = self.dimension else {
            return Ok(Vec::new());
        };
        self.check_dimension(dimension, query.len())?;

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, (_, embedding))| (i, cosine_similarity(query, embedding)))
            .collect();

        // stable on ties, so equal scores keep insertion order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, score)| SearchResult {
                chunk: self.entries[i].0.clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.dimension = None;
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same length");

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
