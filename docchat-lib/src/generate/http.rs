use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::generate::{prepare_prompt, GenerationParams, Generator};
use crate::{Error, Result};

/// Generator backed by an OpenAI-compatible chat completions endpoint.
///
/// Each call sends the prompt as a single user message. No retries; a
/// failed call surfaces as [`Error::Generation`].
pub struct HttpGenerator {
    base_url: String,
    model: String,
    client: Client,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

impl HttpGenerator {
    /// Create a generator for `model` served at `base_url`.
    ///
    /// `timeout` of `None` waits for the server indefinitely.
    pub fn new(base_url: &str, model: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Generation(format!("http client: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        })
    }

    /// Whether the server answers its model listing.
    #[must_use]
    pub fn health_check(&self) -> bool {
        let url = format!("{}/v1/models", self.base_url);
        self.client
            .get(&url)
            .send()
            .map(|resp| resp.status().is_success())
            .unwrap_or(false)
    }

    fn request_body(&self, prompt: &str, params: &GenerationParams) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": params.max_tokens,
            "stream": false,
        });
        if let (Some(obj), Some(t)) = (body.as_object_mut(), params.temperature) {
            obj.insert("temperature".to_string(), json!(t));
        }
        body
    }
}

impl Generator for HttpGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn generate(&mut self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let prompt = prepare_prompt(prompt, params)?;
        let url = format!("{}/v1/chat/completions", self.base_url);
        debug!(model = %self.model, chars = prompt.len(), "requesting completion");

        let res = self
            .client
            .post(&url)
            .json(&self.request_body(prompt, params))
            .send()
            .map_err(|e| Error::Generation(format!("request to {url} failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().unwrap_or_default();
            return Err(Error::Generation(format!("server returned {status}: {text}")));
        }

        let completion: ChatCompletion = res
            .json()
            .map_err(|e| Error::Generation(format!("malformed completion: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default().trim().to_string())
            .ok_or_else(|| Error::Generation("completion had no choices".to_string()))
    }
}
