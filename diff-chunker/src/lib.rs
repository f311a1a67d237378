//! Syntax-aware subdivision of diff chunks.
//!
//! One `@@` hunk can span several unrelated edits. This crate splits a
//! [`gcommit_patch::DiffChunk`] into smaller chunks whose boundaries follow
//! the syntax tree of the combined line content, under a character budget,
//! so that each piece can be embedded and clustered on its own. Files in a
//! language without a grammar fall back to plain line windows.

mod ast;
mod chunker;
mod error;
mod language;

pub use chunker::{ChunkerConfig, DiffChunker};
pub use error::{ChunkerError, Result};
pub use language::Language;
