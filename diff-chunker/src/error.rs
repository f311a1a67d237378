use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur while splitting a diff chunk
#[derive(Debug, Error)]
pub enum ChunkerError {
    /// No grammar is registered for the language
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// Tree-sitter failed to produce a tree
    #[error("parse error: {0}")]
    ParseError(String),
}

impl ChunkerError {
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}
