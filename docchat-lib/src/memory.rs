//! Conversation memory
//!
//! An append-only log of question/answer turns for one session. The full log
//! is kept for display; prompts only see a recent window of it.

use serde::Serialize;

use crate::answer::Answer;

/// One question and the answer it got
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub question: String,
    pub answer: Answer,
}

/// Ordered turn log, oldest first
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<Turn>,
}

impl ConversationMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn.
    pub fn push(&mut self, question: impl Into<String>, answer: Answer) {
        self.turns.push(Turn {
            question: question.into(),
            answer,
        });
    }

    /// All turns, oldest first.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The last `n` turns, oldest first.
    #[must_use]
    pub fn recent(&self, n: usize) -> &[Turn] {
        &self.turns[self.turns.len().saturating_sub(n)..]
    }

    /// All turns, newest first, as the chat history is displayed.
    pub fn newest_first(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().rev()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Forget every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
