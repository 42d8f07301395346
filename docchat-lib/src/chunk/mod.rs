//! Document chunking strategies
//!
//! Extracted document text is split into overlapping windows small enough for
//! the embedding model and the generation prompt:
//! - [`FixedSizeChunker`]: fixed character windows with a fixed overlap
//! - [`RecursiveChunker`]: prefers paragraph, line, sentence and word
//!   boundaries, falling back to fixed windows for oversize pieces
//!
//! # Usage
//!
//! ```ignore
//! use docchat_lib::chunk::{Chunker, ChunkMetadata, FixedSizeChunker};
//!
//! let chunker = FixedSizeChunker::new(500, 50)?;
//! let chunks = chunker.chunk(&document.text, ChunkMetadata::for_source(&document.name));
//! ```

use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default window size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive windows in characters
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

/// A chunk of text with its metadata
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct Chunk {
    /// Identifier derived from source, position and content
    pub id: String,
    /// The text content of this chunk
    pub content: String,
    /// Metadata about the source and position
    pub metadata: ChunkMetadata,
}

/// Metadata associated with a chunk
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct ChunkMetadata {
    /// Name of the document this chunk was cut from
    pub source_id: Option<String>,
    /// Character offset of the chunk within the source text
    pub position: usize,
    /// Total number of chunks from this source
    pub total_chunks: Option<usize>,
}

impl ChunkMetadata {
    /// Metadata pointing back at the named source document.
    #[must_use]
    pub fn for_source(name: &str) -> Self {
        Self {
            source_id: Some(name.to_string()),
            ..Self::default()
        }
    }
}

/// Trait for document chunking strategies
pub trait Chunker: Send + Sync {
    /// Split content into chunks
    ///
    /// # Arguments
    /// * `content` - The text content to chunk
    /// * `metadata` - Base metadata to attach to each chunk
    ///
    /// # Returns
    /// The chunks in document order. Empty or whitespace-only content
    /// yields no chunks.
    fn chunk(&self, content: &str, metadata: ChunkMetadata) -> Vec<Chunk>;

    /// Returns the name of this chunking strategy
    fn name(&self) -> &str;
}

/// Chunking strategy selectable from configuration
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStrategy {
    #[default]
    Fixed,
    Recursive,
}

impl ChunkStrategy {
    /// Build the chunker for this strategy.
    pub fn build(self, chunk_size: usize, overlap: usize) -> Result<Box<dyn Chunker>> {
        Ok(match self {
            Self::Fixed => Box::new(FixedSizeChunker::new(chunk_size, overlap)?),
            Self::Recursive => Box::new(RecursiveChunker::new(chunk_size, overlap)?),
        })
    }
}

impl std::str::FromStr for ChunkStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(Self::Fixed),
            "recursive" => Ok(Self::Recursive),
            other => Err(Error::InvalidInput(format!("unknown chunk strategy '{other}'"))),
        }
    }
}

fn validate_window(chunk_size: usize, overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(Error::Chunking("chunk size must be greater than zero".to_string()));
    }
    if overlap >= chunk_size {
        return Err(Error::Chunking(format!(
            "overlap ({overlap}) must be less than chunk size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Assemble chunks from `(char offset, text)` pieces, filling in ids and
/// position metadata.
fn assemble(pieces: Vec<(usize, String)>, mut metadata: ChunkMetadata) -> Vec<Chunk> {
    metadata.total_chunks = Some(pieces.len());

    pieces
        .into_iter()
        .map(|(position, content)| {
            let mut m = metadata.clone();
            m.position = position;
            Chunk {
                id: generate_id(m.source_id.as_deref(), position, &content),
                content,
                metadata: m,
            }
        })
        .collect()
}

fn generate_id(source: Option<&str>, position: usize, content: &str) -> String {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    position.hash(&mut hasher);
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

mod fixed;
mod recursive;

pub use fixed::*;
pub use recursive::*;
