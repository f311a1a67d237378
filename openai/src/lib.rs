//! OpenAI-backed embedding and commit-message services.
//!
//! Thin async HTTP clients over the embeddings and chat-completions
//! endpoints. The pipeline treats both as opaque collaborators: an embedding
//! failure degrades to an empty vector and a summarization failure to a
//! stock message, never to a hard error.

mod client;
mod error;
mod text;

pub use client::{OpenAiClient, CHAT_MODEL, EMBEDDING_MODEL, MAX_EMBEDDING_BYTES};
pub use error::{OpenAiError, Result};
pub use text::utf8_truncate;
