//! Question answering session
//!
//! A [`Session`] owns everything one conversation needs: the chunker, the
//! search engine over the current documents, the generators and the turn log.
//! Each question runs
//!
//! ```text
//! embed query -> retrieve top_k -> compose prompt -> generate -> evaluate
//! ```
//!
//! and a weak grounded answer (see [`is_insufficient`]) is replaced by the
//! fallback generator in general mode, or by the fixed "no relevant
//! information" answer in document-only mode.
//!
//! # Usage
//!
//! ```ignore
//! use docchat_lib::session::{Session, SessionConfig};
//!
//! let mut session = Session::new(embedder, generator, SessionConfig::default())?
//!     .with_fallback(assistant);
//! session.ingest(documents)?;
//! if let Some(answer) = session.ask("What color is the sky?") {
//!     println!("[{}] {answer}", answer.origin);
//! }
//! ```

use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::answer::{is_insufficient, Answer};
use crate::chunk::{Chunk, ChunkMetadata, ChunkStrategy, Chunker};
use crate::config::Config;
use crate::embed::Embedder;
use crate::generate::{GenerationParams, Generator};
use crate::load::Document;
use crate::memory::{ConversationMemory, Turn};
use crate::prompt::{condense_prompt, fallback_prompt, PromptBuilder};
use crate::search::SearchEngine;
use crate::store::{MemoryStore, SearchResult};
use crate::Result;

/// How a session answers when the documents don't help
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Fall back to the general assistant
    General,
    /// Only ever answer from the documents
    DocumentOnly,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::General => "general",
            Self::DocumentOnly => "document-only",
        })
    }
}

/// Per-session settings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Chunks retrieved per question
    pub top_k: usize,
    pub chunk_strategy: ChunkStrategy,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Turns included in grounded prompts
    pub memory_window: usize,
    pub condense_question: bool,
    pub generation: GenerationParams,
    pub fallback: GenerationParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let config = Config::default();
        config.session(config.retrieval.top_k)
    }
}

/// Outcome of [`Session::ingest`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: usize,
    pub chunks: usize,
}

pub struct Session<E: Embedder, G: Generator, F: Generator = G> {
    engine: SearchEngine<E, MemoryStore>,
    chunker: Box<dyn Chunker>,
    generator: G,
    fallback: Option<F>,
    memory: ConversationMemory,
    prompts: PromptBuilder,
    config: SessionConfig,
    last_retrieval: Vec<SearchResult>,
}

impl<E: Embedder, G: Generator> Session<E, G> {
    /// Create a document-only session with no documents.
    pub fn new(embedder: E, generator: G, config: SessionConfig) -> Result<Self> {
        let chunker = config
            .chunk_strategy
            .build(config.chunk_size, config.chunk_overlap)?;

        Ok(Self {
            engine: SearchEngine::new(embedder, MemoryStore::new()),
            chunker,
            generator,
            fallback: None,
            memory: ConversationMemory::new(),
            prompts: PromptBuilder::new(config.generation.max_prompt_chars),
            config,
            last_retrieval: Vec::new(),
        })
    }
}

impl<E: Embedder, G: Generator, F: Generator> Session<E, G, F> {
    /// Switch to general mode, answering with `fallback` when the documents
    /// don't help.
    #[must_use]
    pub fn with_fallback<F2: Generator>(self, fallback: F2) -> Session<E, G, F2> {
        Session {
            engine: self.engine,
            chunker: self.chunker,
            generator: self.generator,
            fallback: Some(fallback),
            memory: self.memory,
            prompts: self.prompts,
            config: self.config,
            last_retrieval: self.last_retrieval,
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.fallback.is_some() {
            Mode::General
        } else {
            Mode::DocumentOnly
        }
    }

    /// Chunk `documents` and replace the whole index with them.
    ///
    /// The documents are consumed; only their chunks are kept. The previous
    /// index is discarded even if nothing new is indexed.
    pub fn ingest(&mut self, documents: Vec<Document>) -> Result<IngestReport> {
        let count = documents.len();
        let chunks: Vec<Chunk> = documents
            .into_iter()
            .flat_map(|doc| {
                if doc.is_empty() {
                    warn!(name = %doc.name, "document has no extractable text");
                }
                self.chunker
                    .chunk(&doc.text, ChunkMetadata::for_source(&doc.name))
            })
            .collect();

        self.last_retrieval.clear();
        self.engine.rebuild(&chunks)?;

        let report = IngestReport {
            documents: count,
            chunks: chunks.len(),
        };
        info!(
            documents = report.documents,
            chunks = report.chunks,
            chunker = self.chunker.name(),
            "ingested documents"
        );
        Ok(report)
    }

    /// Whether any chunks are indexed.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        !self.engine.is_empty()
    }

    /// Answer `question` and record the turn.
    ///
    /// Returns `None` for blank input, which is not recorded. Failures are
    /// reported as an [`Origin::Error`](crate::answer::Origin::Error) answer
    /// rather than an `Err`.
    pub fn ask(&mut self, question: &str) -> Option<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        let answer = match self.respond(question) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "failed to answer question");
                Answer::error(&e)
            }
        };

        debug!(origin = %answer.origin, "answered question");
        self.memory.push(question, answer.clone());
        Some(answer)
    }

    fn respond(&mut self, question: &str) -> Result<Answer> {
        self.last_retrieval.clear();

        if self.engine.is_empty() {
            info!(mode = %self.mode(), "no documents indexed, skipping retrieval");
            return self.fall_back(question);
        }

        let query = self.standalone_question(question)?;
        let results = self.engine.search(&query, self.config.top_k)?;
        debug!(
            query = %query,
            retrieved = results.len(),
            best = ?results.first().map(|r| r.score),
            "retrieved chunks"
        );

        let chunks: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        let prompt = self.prompts.grounded(
            question,
            &chunks,
            self.memory.recent(self.config.memory_window),
        );

        let response = self.generator.generate(&prompt, &self.config.generation)?;
        self.last_retrieval = results;

        let response = response.trim();
        if is_insufficient(response) {
            debug!(response, "grounded answer insufficient");
            return self.fall_back(question);
        }
        Ok(Answer::retrieved(response))
    }

    fn fall_back(&mut self, question: &str) -> Result<Answer> {
        match self.fallback.as_mut() {
            Some(fallback) => {
                let text = fallback.generate(&fallback_prompt(question), &self.config.fallback)?;
                Ok(Answer::fallback(text.trim()))
            }
            None => Ok(Answer::not_found()),
        }
    }

    /// Rewrite a follow-up into a self-contained retrieval query.
    fn standalone_question(&mut self, question: &str) -> Result<String> {
        if !self.config.condense_question || self.memory.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = condense_prompt(self.memory.recent(self.config.memory_window), question);
        let condensed = self.generator.generate(&prompt, &self.config.generation)?;
        let condensed = condensed.trim();
        if condensed.is_empty() {
            return Ok(question.to_string());
        }
        Ok(condensed.to_string())
    }

    /// Forget the conversation. The index is kept.
    pub fn clear(&mut self) {
        self.memory.clear();
        self.last_retrieval.clear();
    }

    /// All turns so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Turn] {
        self.memory.turns()
    }

    #[must_use]
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Chunks behind the most recent grounded answer, best first.
    #[must_use]
    pub fn last_retrieval(&self) -> &[SearchResult] {
        &self.last_retrieval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::{Origin, NO_MATCH_MESSAGE};
    use crate::embed::Embedding;
    use crate::load::load_bytes;
    use crate::Error;

    /// Counts occurrences of a small vocabulary.
    #[derive(Default)]
    struct StubEmbedder {
        queries: usize,
    }

    const VOCAB: [&str; 5] = ["sky", "blue", "grass", "green", "sea"];

    fn encode(text: &str) -> Embedding {
        let lower = text.to_lowercase();
        VOCAB.iter().map(|w| lower.matches(w).count() as f32).collect()
    }

    impl Embedder for StubEmbedder {
        fn embed_documents(&mut self, texts: &[&str]) -> Result<Vec<Embedding>> {
            Ok(texts.iter().map(|t| encode(t)).collect())
        }

        fn embed_query(&mut self, text: &str) -> Result<Embedding> {
            self.queries += 1;
            Ok(encode(text))
        }

        fn dimension(&self) -> usize {
            VOCAB.len()
        }

        fn model_name(&self) -> &str {
            "stub"
        }
    }

    /// Replies with a fixed text, or fails, and records every prompt.
    struct Scripted {
        reply: Option<String>,
        prompts: Vec<String>,
    }

    impl Scripted {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                prompts: Vec::new(),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                prompts: Vec::new(),
            }
        }
    }

    impl Generator for Scripted {
        fn generate(&mut self, prompt: &str, _params: &GenerationParams) -> Result<String> {
            self.prompts.push(prompt.to_string());
            self.reply
                .clone()
                .ok_or_else(|| Error::Generation("model crashed".to_string()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn doc(name: &str, text: &str) -> Document {
        load_bytes(name, text.as_bytes()).unwrap()
    }

    fn document_only(reply: Scripted, config: SessionConfig) -> Session<StubEmbedder, Scripted> {
        Session::new(StubEmbedder::default(), reply, config).unwrap()
    }

    fn general(reply: Scripted, assistant: Scripted) -> Session<StubEmbedder, Scripted> {
        document_only(reply, SessionConfig::default()).with_fallback(assistant)
    }

    #[test]
    fn test_mode() {
        let session = document_only(Scripted::replying("x"), SessionConfig::default());
        assert_eq!(session.mode(), Mode::DocumentOnly);
        let session = session.with_fallback(Scripted::replying("y"));
        assert_eq!(session.mode(), Mode::General);
    }

    #[test]
    fn test_grounded_answer_uses_retrieved_chunk() {
        let config = SessionConfig {
            top_k: 1,
            ..SessionConfig::default()
        };
        let mut session = document_only(Scripted::replying("The sky is blue."), config);
        let report = session
            .ingest(vec![
                doc("sky.txt", "The sky is blue."),
                doc("grass.txt", "The grass is green."),
            ])
            .unwrap();
        assert_eq!(report, IngestReport { documents: 2, chunks: 2 });

        let answer = session.ask("What color is the sky?").unwrap();
        assert_eq!(answer, Answer::retrieved("The sky is blue."));

        let retrieved = session.last_retrieval();
        assert_eq!(retrieved.len(), 1);
        assert_eq!(retrieved[0].chunk.content, "The sky is blue.");
        assert_eq!(retrieved[0].chunk.metadata.source_id.as_deref(), Some("sky.txt"));

        let prompt = &session.generator.prompts[0];
        assert!(prompt.contains("The sky is blue."));
        assert!(!prompt.contains("grass"));
    }

    #[test]
    fn test_no_documents_goes_straight_to_fallback() {
        let mut session = general(Scripted::replying("unused"), Scripted::replying("Hello there friend!"));

        let answer = session.ask("hi").unwrap();
        assert_eq!(answer, Answer::fallback("Hello there friend!"));
        assert_eq!(session.engine.embedder().queries, 0);
        assert!(session.generator.prompts.is_empty());
        assert!(session.last_retrieval().is_empty());

        let assistant = session.fallback.as_ref().unwrap();
        assert_eq!(assistant.prompts, vec![fallback_prompt("hi")]);
    }

    #[test]
    fn test_no_documents_in_document_only_mode() {
        let mut session = document_only(Scripted::replying("unused"), SessionConfig::default());

        let answer = session.ask("anything?").unwrap();
        assert_eq!(answer.origin, Origin::NotFound);
        assert_eq!(answer.text, NO_MATCH_MESSAGE);
        assert_eq!(session.engine.embedder().queries, 0);
    }

    #[test]
    fn test_generation_failure_becomes_error_answer() {
        let mut session = document_only(Scripted::failing(), SessionConfig::default());
        session.ingest(vec![doc("sky.txt", "The sky is blue.")]).unwrap();

        let answer = session.ask("What color is the sky?").unwrap();
        assert_eq!(answer.origin, Origin::Error);
        assert!(answer.text.starts_with("error:"));
        assert!(answer.text.contains("model crashed"));

        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].question, "What color is the sky?");
    }

    #[test]
    fn test_fallback_failure_becomes_error_answer() {
        let mut session = general(Scripted::replying("unused"), Scripted::failing());
        let answer = session.ask("hi").unwrap();
        assert!(answer.is_error());
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_insufficient_answer_uses_fallback() {
        let mut session = general(
            Scripted::replying("Sorry, I cannot tell."),
            Scripted::replying("The sea is usually blue."),
        );
        session.ingest(vec![doc("sky.txt", "The sky is blue.")]).unwrap();

        let answer = session.ask("What color is the sea?").unwrap();
        assert_eq!(answer.origin, Origin::Fallback);
        assert_eq!(answer.text, "The sea is usually blue.");
    }

    #[test]
    fn test_insufficient_answer_in_document_only_mode() {
        let mut session = document_only(Scripted::replying("blue"), SessionConfig::default());
        session.ingest(vec![doc("sky.txt", "The sky is blue.")]).unwrap();

        let answer = session.ask("What color is the sky?").unwrap();
        assert_eq!(answer, Answer::not_found());
    }

    #[test]
    fn test_blank_question_is_ignored() {
        let mut session = general(Scripted::replying("a b c"), Scripted::replying("a b c"));
        assert!(session.ask("").is_none());
        assert!(session.ask("   \n").is_none());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_clear_history() {
        let mut session = general(Scripted::replying("a b c"), Scripted::replying("d e f"));
        for q in ["one", "two", "three"] {
            session.ask(q);
        }
        assert_eq!(session.history().len(), 3);

        session.clear();
        assert_eq!(session.history().len(), 0);
        session.clear();
        assert_eq!(session.history().len(), 0);
    }

    #[test]
    fn test_ingest_replaces_previous_documents() {
        let mut session = document_only(Scripted::replying("It is green."), SessionConfig::default());
        session.ingest(vec![doc("sky.txt", "The sky is blue.")]).unwrap();
        session.ingest(vec![doc("grass.txt", "The grass is green.")]).unwrap();

        session.ask("What about the sky?").unwrap();
        assert!(session
            .last_retrieval()
            .iter()
            .all(|r| r.chunk.metadata.source_id.as_deref() == Some("grass.txt")));
    }

    #[test]
    fn test_ingest_nothing_leaves_session_unindexed() {
        let mut session = document_only(Scripted::replying("x"), SessionConfig::default());
        session.ingest(vec![doc("sky.txt", "The sky is blue.")]).unwrap();
        assert!(session.is_indexed());

        let report = session.ingest(vec![doc("empty.txt", "  \n")]).unwrap();
        assert_eq!(report.chunks, 0);
        assert!(!session.is_indexed());
    }

    #[test]
    fn test_prompt_memory_is_windowed() {
        let config = SessionConfig {
            memory_window: 1,
            ..SessionConfig::default()
        };
        let mut session = document_only(Scripted::replying("The sky is blue."), config);
        session.ingest(vec![doc("sky.txt", "The sky is blue.")]).unwrap();

        session.ask("first question about the sky");
        session.ask("second question about the sky");
        session.ask("third question about the sky");

        let last = session.generator.prompts.last().unwrap();
        assert!(!last.contains("User: first question"));
        assert!(last.contains("User: second question"));
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn test_condense_question_rewrites_follow_ups() {
        let config = SessionConfig {
            condense_question: true,
            ..SessionConfig::default()
        };
        let mut session = document_only(Scripted::replying("The sky is blue."), config);
        session.ingest(vec![doc("sky.txt", "The sky is blue.")]).unwrap();

        session.ask("What color is the sky?");
        assert_eq!(session.generator.prompts.len(), 1);

        session.ask("Why?");
        let prompts = &session.generator.prompts;
        assert_eq!(prompts.len(), 3);
        assert!(prompts[1].ends_with("Follow-up question: Why?\nStandalone question:"));
        assert!(prompts[2].ends_with("Question: Why?\nAnswer:"));
    }
}
