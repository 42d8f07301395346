//! Document loading and text extraction
//!
//! Dispatch is purely on the (case-insensitive) file extension:
//!
//! | extension | extraction                                   |
//! |-----------|----------------------------------------------|
//! | `txt`     | UTF-8 decode                                 |
//! | `csv`     | one `header: value, ...` line per record     |
//! | `xlsx`    | per sheet, one line per row, first row as headers |
//! | `pdf`     | text per page, empty pages skipped           |
//! | `docx`    | text per paragraph                           |
//!
//! Failures inside a document (a bad row, page or paragraph) are skipped so a
//! document may come back with partial text. Only a document that cannot be
//! opened at all is an error.
//!
//! # Usage
//!
//! ```ignore
//! use docchat_lib::load;
//!
//! let doc = load::load_path("data_files/report.pdf")?;
//! let uploaded = load::load_bytes("notes.txt", &bytes)?;
//! let all = load::load_dir("data_files")?;
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Supported input formats
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Text,
    Csv,
    Xlsx,
    Pdf,
    Docx,
}

impl Format {
    /// All supported formats.
    pub const ALL: [Format; 5] = [Self::Text, Self::Csv, Self::Xlsx, Self::Pdf, Self::Docx];

    /// File extension handled by this format, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    /// Detect the format from a file name.
    ///
    /// Fails with [`Error::UnsupportedFormat`] for anything without a
    /// supported extension.
    pub fn from_name(name: &str) -> Result<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| Error::UnsupportedFormat(name.to_string()))?;

        Self::ALL
            .into_iter()
            .find(|f| f.extension() == ext)
            .ok_or_else(|| Error::UnsupportedFormat(name.to_string()))
    }

    /// Detect the format from a path.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_name(&path.to_string_lossy())
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A loaded document with its extracted text
///
/// Only the text is kept; the raw file content is dropped once extracted.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name the document was loaded from
    pub name: String,
    pub format: Format,
    /// All readable text, possibly partial
    pub text: String,
    /// Number of pages, for paginated formats
    pub pages: Option<usize>,
}

impl Document {
    /// Word count and page estimate for display.
    #[must_use]
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            name: self.name.clone(),
            format: self.format,
            word_count: word_count(&self.text),
            pages: self.pages,
        }
    }

    /// Whether extraction produced any non-whitespace text.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Summary statistics of a loaded document
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DocumentSummary {
    pub name: String,
    pub format: Format,
    pub word_count: usize,
    pub pages: Option<usize>,
}

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word regex"));

/// Count `\w+` runs in `text`.
#[must_use]
pub fn word_count(text: &str) -> usize {
    WORD.find_iter(text).count()
}

/// Load a document from an in-memory upload.
///
/// `name` is only used for format detection and display.
pub fn load_bytes(name: &str, bytes: &[u8]) -> Result<Document> {
    let format = Format::from_name(name)?;

    let (text, pages) = match format {
        Format::Text => (text::extract(name, bytes), None),
        Format::Csv => (tabular::extract_csv(bytes), None),
        Format::Xlsx => (tabular::extract_xlsx(bytes)?, None),
        Format::Pdf => {
            let pages = pdf::extract(bytes)?;
            let count = pages.total;
            (pages.text, Some(count))
        }
        Format::Docx => (docx::extract(bytes)?, None),
    };

    debug!(name, %format, chars = text.len(), "extracted document text");

    Ok(Document {
        name: name.to_string(),
        format,
        text,
        pages,
    })
}

/// Load a document from disk.
pub fn load_path(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::NotFound(path.display().to_string()));
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    // check the format before reading a possibly large file
    Format::from_name(&name)?;
    load_bytes(&name, &fs::read(path)?)
}

/// Load every supported file directly inside `dir`, in file name order.
///
/// A missing directory is created and yields no documents. Files that fail to
/// load are logged and skipped.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Vec<Document>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        info!(dir = %dir.display(), "document directory missing, creating it");
        fs::create_dir_all(dir)?;
        return Ok(Vec::new());
    }

    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && Format::from_path(p).is_ok())
        .collect();
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match load_path(&path) {
            Ok(doc) => documents.push(doc),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping document"),
        }
    }

    info!(dir = %dir.display(), count = documents.len(), "loaded documents");
    Ok(documents)
}

mod docx;
mod pdf;
mod tabular;
mod text;

#[cfg(test)]
mod fixtures;
