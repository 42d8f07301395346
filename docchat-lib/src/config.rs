//! Configuration
//!
//! Loaded from a TOML file; every key is optional and falls back to the
//! defaults below.
//!
//! ```toml
//! [documents]
//! dir = "data_files"
//!
//! [chunking]
//! strategy = "fixed"   # or "recursive"
//! size = 500
//! overlap = 50
//!
//! [retrieval]
//! top_k = 2            # documents directory
//! upload_top_k = 3     # files given on the command line
//!
//! [generation]
//! base_url = "http://127.0.0.1:8080"
//! model = "flan-t5-base"
//! max_tokens = 512
//!
//! [fallback]
//! enabled = true
//! model = "flan-t5-large"
//! max_tokens = 150
//!
//! [memory]
//! window = 5
//! condense_question = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chunk::{ChunkStrategy, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::generate::GenerationParams;
use crate::session::SessionConfig;
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub documents: DocumentsConfig,
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub fallback: FallbackConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Directory scanned for documents at startup
    pub dir: PathBuf,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data_files"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub strategy: ChunkStrategy,
    /// Window size in characters
    pub size: usize,
    /// Characters shared by consecutive windows
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::default(),
            size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question for the documents directory
    pub top_k: usize,
    /// Chunks retrieved per question for uploaded files
    pub upload_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            upload_top_k: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub show_download_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            show_download_progress: true,
        }
    }
}

/// Model answering from retrieved context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Root of an OpenAI-compatible server
    pub base_url: String,
    pub model: String,
    pub max_tokens: usize,
    pub max_prompt_chars: usize,
    pub truncation: bool,
    pub temperature: Option<f32>,
    /// Request timeout; unset waits indefinitely
    pub timeout_secs: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            model: "flan-t5-base".to_string(),
            max_tokens: 512,
            max_prompt_chars: 4000,
            truncation: true,
            temperature: None,
            timeout_secs: None,
        }
    }
}

impl GenerationConfig {
    #[must_use]
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.max_tokens,
            max_prompt_chars: self.max_prompt_chars,
            truncation: self.truncation,
            temperature: self.temperature,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// General assistant used when grounded answers fall short
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Without a fallback, weak answers become "no relevant information"
    pub enabled: bool,
    /// Defaults to the generation server
    pub base_url: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub max_prompt_chars: usize,
    pub truncation: bool,
    pub temperature: Option<f32>,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            model: "flan-t5-large".to_string(),
            max_tokens: 150,
            max_prompt_chars: 2000,
            truncation: true,
            temperature: None,
        }
    }
}

impl FallbackConfig {
    #[must_use]
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            max_tokens: self.max_tokens,
            max_prompt_chars: self.max_prompt_chars,
            truncation: self.truncation,
            temperature: self.temperature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Most recent turns included in each prompt
    pub window: usize,
    /// Rewrite follow-up questions into standalone ones before retrieval
    pub condense_question: bool,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window: 5,
            condense_question: false,
        }
    }
}

impl Config {
    /// Read and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::parse(&raw)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if:
    /// - `chunking.size == 0` or `chunking.overlap >= chunking.size`
    /// - `retrieval.top_k == 0` or `retrieval.upload_top_k == 0`
    /// - a model has `max_tokens == 0` or `max_prompt_chars == 0`
    pub fn validate(&self) -> Result<()> {
        if self.chunking.size == 0 || self.chunking.overlap >= self.chunking.size {
            return Err(Error::Config(format!(
                "chunking.overlap ({}) must be less than chunking.size ({})",
                self.chunking.overlap, self.chunking.size
            )));
        }
        if self.retrieval.top_k == 0 || self.retrieval.upload_top_k == 0 {
            return Err(Error::Config("retrieval top_k values must be greater than zero".to_string()));
        }
        for (section, params) in [
            ("generation", self.generation.params()),
            ("fallback", self.fallback.params()),
        ] {
            if params.max_tokens == 0 || params.max_prompt_chars == 0 {
                return Err(Error::Config(format!(
                    "{section}.max_tokens and {section}.max_prompt_chars must be greater than zero"
                )));
            }
        }
        Ok(())
    }

    /// Session settings retrieving `top_k` chunks per question.
    #[must_use]
    pub fn session(&self, top_k: usize) -> SessionConfig {
        SessionConfig {
            top_k,
            chunk_strategy: self.chunking.strategy,
            chunk_size: self.chunking.size,
            chunk_overlap: self.chunking.overlap,
            memory_window: self.memory.window,
            condense_question: self.memory.condense_question,
            generation: self.generation.params(),
            fallback: self.fallback.params(),
        }
    }

    /// Base URL of the fallback server.
    #[must_use]
    pub fn fallback_base_url(&self) -> &str {
        self.fallback
            .base_url
            .as_deref()
            .unwrap_or(&self.generation.base_url)
    }
}
