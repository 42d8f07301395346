//! Text generation backends
//!
//! The answerers only need "prompt in, text out". [`HttpGenerator`] talks to
//! any OpenAI-compatible local server (llama.cpp `llama-server`, LM Studio,
//! Ollama); tests plug in scripted generators.
//!
//! # Usage
//!
//! ```ignore
//! use docchat_lib::generate::{Generator, GenerationParams, HttpGenerator};
//!
//! let mut generator = HttpGenerator::new("http://127.0.0.1:8080", "flan-t5-base", None)?;
//! let text = generator.generate("Answer briefly: why is the sky blue?", &GenerationParams::default())?;
//! ```

use crate::{Error, Result};

/// Limits applied to one generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    /// Maximum number of tokens to generate
    pub max_tokens: usize,
    /// Maximum prompt length in characters
    pub max_prompt_chars: usize,
    /// Cut over-long prompts down to `max_prompt_chars` instead of failing
    pub truncation: bool,
    pub temperature: Option<f32>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            max_prompt_chars: 4000,
            truncation: true,
            temperature: None,
        }
    }
}

/// Trait for generative text models
pub trait Generator: Send {
    /// Generate a completion for `prompt`.
    ///
    /// Implementations run the prompt through [`prepare_prompt`] so the input
    /// length limit is honoured the same way by every backend.
    fn generate(&mut self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

/// Apply the input length limit of `params` to `prompt`.
///
/// With truncation on, an over-long prompt keeps its leading
/// `max_prompt_chars` characters; with truncation off it is an error.
pub fn prepare_prompt<'a>(prompt: &'a str, params: &GenerationParams) -> Result<&'a str> {
    match prompt.char_indices().nth(params.max_prompt_chars) {
        None => Ok(prompt),
        Some((cut, _)) if params.truncation => Ok(&prompt[..cut]),
        Some(_) => Err(Error::Generation(format!(
            "prompt longer than {} characters and truncation is disabled",
            params.max_prompt_chars
        ))),
    }
}

mod http;
pub use http::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_prompt_chars: usize, truncation: bool) -> GenerationParams {
        GenerationParams {
            max_prompt_chars,
            truncation,
            ..GenerationParams::default()
        }
    }

    #[test]
    fn test_short_prompt_untouched() {
        assert_eq!(prepare_prompt("hello", &params(5, false)).unwrap(), "hello");
    }

    #[test]
    fn test_truncation_keeps_prefix_on_char_boundary() {
        assert_eq!(prepare_prompt("héllo wörld", &params(7, true)).unwrap(), "héllo w");
    }

    #[test]
    fn test_overflow_without_truncation_is_error() {
        let err = prepare_prompt("hello world", &params(5, false)).unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
    }
}
