//! Prompt assembly
//!
//! Grounded prompts are laid out as instructions, retrieved context, recent
//! conversation and finally the question:
//!
//! ```text
//! Answer the question using only the context below. ...
//!
//! Context:
//! <chunk 1>
//!
//! <chunk 2>
//!
//! Conversation so far:
//! User: <question>
//! Assistant: <answer>
//!
//! Question: <question>
//! Answer:
//! ```
//!
//! When the prompt is over budget the oldest turns go first, then the lowest
//! ranked chunks. The question itself is never dropped.

use crate::memory::Turn;

const GROUNDED_INSTRUCTIONS: &str = "Answer the question using only the context below. \
If the context does not contain the answer, say that you don't know.";

const CONDENSE_INSTRUCTIONS: &str = "Rewrite the follow-up question so that it can be \
understood without the conversation. Reply with the rewritten question only.";

/// Builds grounded prompts within a character budget
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    max_chars: usize,
}

impl PromptBuilder {
    #[must_use]
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Compose the grounded prompt for `question`.
    ///
    /// `chunks` are in rank order, best first. Turns that ended in an error
    /// are left out.
    #[must_use]
    pub fn grounded(&self, question: &str, chunks: &[&str], turns: &[Turn]) -> String {
        let mut turns: Vec<&Turn> = turns.iter().filter(|t| !t.answer.is_error()).collect();
        let mut chunks = chunks.to_vec();

        loop {
            let prompt = render_grounded(question, &chunks, &turns);
            if prompt.chars().count() <= self.max_chars {
                return prompt;
            }
            if !turns.is_empty() {
                turns.remove(0);
            } else if chunks.pop().is_none() {
                return prompt;
            }
        }
    }
}

fn render_grounded(question: &str, chunks: &[&str], turns: &[&Turn]) -> String {
    let mut prompt = String::from(GROUNDED_INSTRUCTIONS);

    if !chunks.is_empty() {
        prompt.push_str("\n\nContext:\n");
        prompt.push_str(&chunks.join("\n\n"));
    }

    if !turns.is_empty() {
        prompt.push_str("\n\nConversation so far:\n");
        prompt.push_str(&render_turns(turns));
    }

    prompt.push_str("\n\nQuestion: ");
    prompt.push_str(question);
    prompt.push_str("\nAnswer:");
    prompt
}

fn render_turns(turns: &[&Turn]) -> String {
    turns
        .iter()
        .map(|t| format!("User: {}\nAssistant: {}", t.question, t.answer.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt for the general assistant, no document context.
#[must_use]
pub fn fallback_prompt(question: &str) -> String {
    format!("Answer this like a friendly helpful AI assistant: {question}")
}

/// Prompt asking the model to turn a follow-up into a standalone question.
#[must_use]
pub fn condense_prompt(turns: &[Turn], question: &str) -> String {
    let turns: Vec<&Turn> = turns.iter().filter(|t| !t.answer.is_error()).collect();
    format!(
        "{CONDENSE_INSTRUCTIONS}\n\nConversation:\n{}\n\nFollow-up question: {question}\nStandalone question:",
        render_turns(&turns)
    )
}
