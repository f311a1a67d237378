//! Unified-diff model, parser, and patch emitter.
//!
//! This crate owns the in-memory representation of a diff ([`DiffChunk`],
//! [`DiffLine`]), a lenient single-pass parser for `git diff` output
//! ([`DiffParser`]), and the re-emission of chunks as standalone patches that
//! `git apply` accepts even after the chunks have been regrouped
//! ([`render_patch`], [`render_patches`]).

mod emitter;
mod model;
mod parser;

pub use emitter::{render_patch, render_patches};
pub use model::{DiffChunk, DiffLine, LineKind};
pub use parser::DiffParser;
