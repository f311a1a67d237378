use thiserror::Error;

/// Result type for OpenAI client operations
pub type Result<T> = std::result::Result<T, OpenAiError>;

/// Errors that can occur while talking to the OpenAI API
#[derive(Debug, Error)]
pub enum OpenAiError {
    /// No API key in the environment or git config
    #[error("OPENAI_API_KEY not found in environment or git config (custom.openaiApiKey)")]
    MissingCredential,

    /// Transport-level failure
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success HTTP status from the API
    #[error("API error {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Response did not have the expected shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}
