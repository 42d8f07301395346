//! docchat CLI - chat with your documents
//!
//! # Commands
//!
//! ```bash
//! # Chat over everything in the documents directory
//! docchat chat --dir data_files
//!
//! # Document-only chat over specific files
//! docchat upload report.pdf notes.docx
//!
//! # One-shot question
//! docchat ask "What color is the sky?"
//!
//! # Word counts and page estimates
//! docchat summary report.pdf sheet.xlsx
//!
//! # Chunk a document and show results
//! docchat chunk --strategy recursive report.pdf
//! ```
//!
//! Generation needs an OpenAI-compatible server (llama.cpp, LM Studio,
//! Ollama) at `generation.base_url`.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docchat_lib::{
    answer::Answer,
    chunk::{ChunkMetadata, ChunkStrategy, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE},
    config::Config,
    embed::{Embedder, MiniLmEmbedder},
    generate::{Generator, HttpGenerator},
    load::{self, Document},
    memory::ConversationMemory,
    session::Session,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_FILE: &str = "docchat.toml";

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Ask questions about your documents")]
#[command(version)]
struct Cli {
    /// TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Generation server, overrides `generation.base_url`
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Generation model, overrides `generation.model`
    #[arg(long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat over the documents directory, with the general assistant as fallback
    Chat {
        /// Documents directory, overrides `documents.dir`
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Chat over the given files only
    Upload {
        /// Files to load
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Answer a single question and exit
    Ask {
        /// Documents directory, overrides `documents.dir`
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Question to answer
        question: String,
    },

    /// Show word counts and page estimates
    Summary {
        /// Files to summarize
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Chunk a document using specified strategy
    Chunk {
        /// Input file to chunk
        input: PathBuf,

        /// Chunking strategy: "fixed" or "recursive"
        #[arg(short, long, default_value = "fixed")]
        strategy: ChunkStrategy,

        /// Chunk size in characters
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        size: usize,

        /// Characters shared by consecutive chunks
        #[arg(long, default_value_t = DEFAULT_CHUNK_OVERLAP)]
        overlap: usize,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Config::load(DEFAULT_CONFIG_FILE)?,
        None => Config::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config.generation.base_url = base_url.clone();
    }
    if let Some(model) = &cli.model {
        config.generation.model = model.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Build a session retrieving `top_k` chunks per question.
///
/// `general` attaches the fallback assistant when the config enables it.
fn open_session(
    config: &Config,
    top_k: usize,
    general: bool,
) -> Result<Session<MiniLmEmbedder, HttpGenerator>> {
    let embedder = MiniLmEmbedder::new(config.embedding.show_download_progress)?;
    let generator = HttpGenerator::new(
        &config.generation.base_url,
        &config.generation.model,
        config.generation.timeout(),
    )?;
    if !generator.health_check() {
        warn!(
            base_url = %config.generation.base_url,
            "generation server not reachable, answers will report errors"
        );
    }

    let session = Session::new(embedder, generator, config.session(top_k))?;
    if !(general && config.fallback.enabled) {
        return Ok(session);
    }

    let fallback = HttpGenerator::new(
        config.fallback_base_url(),
        &config.fallback.model,
        config.generation.timeout(),
    )?;
    Ok(session.with_fallback(fallback))
}

fn load_files(files: &[PathBuf]) -> Result<Vec<Document>> {
    files
        .iter()
        .map(|path| {
            load::load_path(path).with_context(|| format!("failed to load {}", path.display()))
        })
        .collect()
}

fn print_summaries(documents: &[Document]) {
    for doc in documents {
        let summary = doc.summary();
        match summary.pages {
            Some(pages) => println!(
                "{} ({}): {} words, {} pages",
                summary.name, summary.format, summary.word_count, pages
            ),
            None => println!(
                "{} ({}): {} words",
                summary.name, summary.format, summary.word_count
            ),
        }
    }
}

fn print_answer(answer: &Answer) {
    println!("[{}] {}\n", answer.origin, answer.text);
}

fn print_history(memory: &ConversationMemory) {
    if memory.is_empty() {
        println!("No conversation yet.\n");
        return;
    }
    for turn in memory.newest_first() {
        println!("You: {}", turn.question);
        print_answer(&turn.answer);
    }
}

/// Read questions from stdin until `/quit` or end of input.
fn chat_loop<E: Embedder, G: Generator, F: Generator>(session: &mut Session<E, G, F>) -> Result<()> {
    println!("Type a question, /history, /clear or /quit.\n");

    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                println!("History cleared.\n");
            }
            "/history" => print_history(session.memory()),
            question => {
                if let Some(answer) = session.ask(question) {
                    print_answer(&answer);
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging, quiet by default so the transcript stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Chat { dir } => {
            let dir = dir.unwrap_or_else(|| config.documents.dir.clone());
            let documents = load::load_dir(&dir)?;

            let mut session = open_session(&config, config.retrieval.top_k, true)?;
            let report = session.ingest(documents)?;
            info!(mode = %session.mode(), "session ready");
            println!(
                "Loaded {} documents ({} chunks) from {}",
                report.documents,
                report.chunks,
                dir.display()
            );

            chat_loop(&mut session)?;
        }

        Commands::Upload { files } => {
            let documents = load_files(&files)?;
            print_summaries(&documents);

            let mut session = open_session(&config, config.retrieval.upload_top_k, false)?;
            let report = session.ingest(documents)?;
            println!("Indexed {} chunks\n", report.chunks);

            chat_loop(&mut session)?;
        }

        Commands::Ask { dir, question } => {
            let dir = dir.unwrap_or_else(|| config.documents.dir.clone());
            let documents = load::load_dir(&dir)?;

            let mut session = open_session(&config, config.retrieval.top_k, true)?;
            session.ingest(documents)?;

            match session.ask(&question) {
                Some(answer) => print_answer(&answer),
                None => anyhow::bail!("question is empty"),
            }
        }

        Commands::Summary { files } => {
            for path in &files {
                match load::load_path(path) {
                    Ok(doc) => print_summaries(std::slice::from_ref(&doc)),
                    Err(e) => eprintln!("{}: {e}", path.display()),
                }
            }
        }

        Commands::Chunk {
            input,
            strategy,
            size,
            overlap,
        } => {
            let doc = load::load_path(&input)?;
            let chunker = strategy.build(size, overlap)?;
            let chunks = chunker.chunk(&doc.text, ChunkMetadata::for_source(&doc.name));

            println!(
                "Chunked '{}' into {} chunks using {} strategy:\n",
                doc.name,
                chunks.len(),
                chunker.name()
            );
            for (i, chunk) in chunks.iter().enumerate() {
                let id: String = chunk.id.chars().take(8).collect();
                println!(
                    "--- Chunk {} ({} chars at {}, id: {}) ---",
                    i + 1,
                    chunk.content.chars().count(),
                    chunk.metadata.position,
                    id
                );
                // Show preview (first 200 chars)
                let preview: String = chunk.content.chars().take(200).collect();
                let ellipsis = if chunk.content.chars().count() > 200 { "..." } else { "" };
                println!("{preview}{ellipsis}\n");
            }
        }
    }

    Ok(())
}
