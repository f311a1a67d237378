//! HTTP client for the embeddings and chat-completions endpoints.

use crate::error::{OpenAiError, Result};
use crate::text::utf8_truncate;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::json;
use std::process::Command;
use std::time::Duration;

const EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Model used for chunk embeddings.
pub const EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Model used for commit-message generation.
pub const CHAT_MODEL: &str = "gpt-4o-mini";

/// Embedding inputs are cut to this many bytes, at a code-point boundary.
pub const MAX_EMBEDDING_BYTES: usize = 16000;

const SUMMARY_MAX_TOKENS: u32 = 50;
const SUMMARY_TEMPERATURE: f32 = 0.3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const SUMMARY_FALLBACK: &str = "update code";

const SUMMARY_SYSTEM_PROMPT: &str = "You are a git commit message generator. \
Analyze the code changes and generate a concise commit message that describes \
what was actually modified, added, or fixed in the code. Focus on the \
technical changes, not meta-commentary. Return only the commit message \
without quotes or explanations. Examples: 'add HTTP chunked encoding \
support', 'handle SSL connection errors', 'extract JSON parsing logic'.";

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Async client for the two OpenAI endpoints the pipeline needs.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_key: api_key.into(),
        })
    }

    /// Build a client from `OPENAI_API_KEY`, falling back to the
    /// `custom.openaiApiKey` git config entry.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .or_else(credential_from_git_config)
            .ok_or(OpenAiError::MissingCredential)?;
        Self::new(api_key)
    }

    /// Embed `text`, truncated to [`MAX_EMBEDDING_BYTES`].
    ///
    /// The returned vector is normalized to unit length so that downstream
    /// cosine distances stay meaningful even if the provider ever returns an
    /// unnormalized embedding.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let input = utf8_truncate(text, MAX_EMBEDDING_BYTES);
        let body = json!({
            "model": EMBEDDING_MODEL,
            "input": input,
        });

        let response = self
            .http
            .post(EMBEDDINGS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OpenAiError::Api { status, body });
        }

        let parsed: EmbeddingResponse = response.json().await?;
        let mut embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| OpenAiError::MalformedResponse("empty data array".into()))?;

        normalize(&mut embedding);
        debug!("embedded {} bytes -> {} dims", input.len(), embedding.len());
        Ok(embedding)
    }

    /// Generate a one-line commit message for a diff context.
    ///
    /// The raw completion is trimmed of whitespace and surrounding quotes;
    /// an unusable completion degrades to `"update code"`.
    pub async fn summarize(&self, diff_context: &str) -> Result<String> {
        let body = json!({
            "model": CHAT_MODEL,
            "messages": [
                {"role": "system", "content": SUMMARY_SYSTEM_PROMPT},
                {
                    "role": "user",
                    "content": format!(
                        "Generate a commit message for these code changes:\n{diff_context}"
                    ),
                },
            ],
            "max_tokens": SUMMARY_MAX_TOKENS,
            "temperature": SUMMARY_TEMPERATURE,
        });

        let response = self
            .http
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OpenAiError::Api { status, body });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| OpenAiError::MalformedResponse("empty choices array".into()))?;

        Ok(clean_message(&content))
    }
}

/// Trim whitespace and quoting from a completion; empty results fall back
/// to a stock message.
fn clean_message(raw: &str) -> String {
    let cleaned = raw.trim_matches(|c: char| c.is_whitespace() || c == '"');
    if cleaned.is_empty() {
        SUMMARY_FALLBACK.to_string()
    } else {
        cleaned.to_string()
    }
}

/// Scale `vector` to unit length; zero vectors are left alone.
fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

fn credential_from_git_config() -> Option<String> {
    let output = Command::new("git")
        .args(["config", "--get", "custom.openaiApiKey"])
        .output()
        .ok()?;
    if !output.status.success() {
        warn!("no custom.openaiApiKey in git config");
        return None;
    }
    let key = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if key.is_empty() {
        None
    } else {
        Some(key)
    }
}
