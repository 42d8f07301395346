//! docchat - question answering over your own documents
//!
//! # Architecture
//!
//! ```text
//! Document -> Loader -> Chunker -> Embedder -> Store
//!                                                |
//! Question -> Embedder -> Search <---------------+
//!                           |
//!                 Prompt (chunks + recent turns)
//!                           |
//!                      Generator -> sufficient? -> Answer
//!                                       | no
//!                                   Fallback / "no relevant information"
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docchat_lib::{embed::MiniLmEmbedder, generate::HttpGenerator, load, session::Session};
//!
//! let embedder = MiniLmEmbedder::new(true)?;
//! let generator = HttpGenerator::new("http://127.0.0.1:8080", "flan-t5-base", None)?;
//! let mut session = Session::new(embedder, generator, Default::default())?;
//!
//! session.ingest(load::load_dir("data_files")?)?;
//! let answer = session.ask("What color is the sky?");
//! ```

pub mod answer;
pub mod chunk;
pub mod config;
pub mod embed;
pub mod error;
pub mod generate;
pub mod load;
pub mod memory;
pub mod prompt;
pub mod search;
pub mod session;
pub mod store;

pub use error::{Error, Result};
