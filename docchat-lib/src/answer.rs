//! Answers and the sufficiency heuristic
//!
//! A grounded answer that is empty, shorter than three words, or apologises
//! ("sorry") is treated as "nothing useful was retrieved" and handed to the
//! fallback path. This is a crude proxy for low confidence and is kept in one
//! place so it can be swapped for a retrieval score later.

use std::fmt;

use serde::Serialize;

/// Minimum number of words for a grounded answer to be accepted
pub const MIN_ANSWER_WORDS: usize = 3;

/// Phrase that marks a grounded answer as a non-answer
pub const APOLOGY_MARKER: &str = "sorry";

/// Answer given in document-only mode when retrieval finds nothing useful
pub const NO_MATCH_MESSAGE: &str = "No relevant information found in your uploaded documents.";

/// Where an answer came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Generated from retrieved document chunks
    Retrieved,
    /// Generated by the general assistant without document context
    Fallback,
    /// Document-only mode found nothing relevant
    NotFound,
    /// Retrieval or generation failed; the text describes the failure
    Error,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Retrieved => "documents",
            Self::Fallback => "assistant",
            Self::NotFound => "no match",
            Self::Error => "error",
        })
    }
}

/// The text shown to the user together with its origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub origin: Origin,
}

impl Answer {
    #[must_use]
    pub fn retrieved(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::Retrieved,
        }
    }

    #[must_use]
    pub fn fallback(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: Origin::Fallback,
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self {
            text: NO_MATCH_MESSAGE.to_string(),
            origin: Origin::NotFound,
        }
    }

    /// Render a failure as an answer, `error: <message>`.
    #[must_use]
    pub fn error(err: &crate::Error) -> Self {
        Self {
            text: format!("error: {err}"),
            origin: Origin::Error,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.origin == Origin::Error
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Whether a grounded answer is too weak to show.
#[must_use]
pub fn is_insufficient(response: &str) -> bool {
    response.trim().is_empty()
        || response.split_whitespace().count() < MIN_ANSWER_WORDS
        || response.to_lowercase().contains(APOLOGY_MARKER)
}
