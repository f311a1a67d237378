//! Splitting of one diff chunk into budget-sized pieces.
//!
//! Two paths: syntax-guided (split between the root node's children, packing
//! whole children under the budget) and line-windowed (plain greedy packing)
//! for languages without a grammar or content the parser rejects.
//!
//! Sub-chunk `start` values stay in the old-side coordinate system: each
//! piece starts at the original `start` plus the number of context and
//! deletion lines consumed before it. `is_new` survives only on the first
//! piece (it creates the file) and `is_deleted` only on the last (deletion
//! happens after all content is gone).

use crate::ast::{lines_byte_size, parse_source, split_points};
use crate::language::Language;
use gcommit_patch::{DiffChunk, DiffLine, LineKind};
use log::warn;
use tree_sitter::Node;

/// Character budgets for the two splitting paths.
#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Soft budget for syntax-guided pieces; a single oversize child is
    /// emitted alone.
    pub ast_max_chars: usize,
    /// Budget for line windows; a single oversize line forms its own piece.
    pub line_max_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            ast_max_chars: 1500,
            line_max_chars: 1000,
        }
    }
}

/// Splits [`DiffChunk`]s along syntax boundaries under a character budget.
#[derive(Debug, Default)]
pub struct DiffChunker {
    config: ChunkerConfig,
}

impl DiffChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    /// Split one chunk into budget-sized pieces.
    ///
    /// Pure renames pass through untouched. Concatenating the pieces' lines
    /// always reproduces the input chunk's lines in order.
    pub fn split(&self, chunk: &DiffChunk) -> Vec<DiffChunk> {
        if chunk.is_rename {
            return vec![chunk.clone()];
        }

        let language = Language::from_path(&chunk.filepath);
        if language.supports_ast() {
            let source = chunk.combined_content();
            match parse_source(language, &source) {
                Ok(tree) => {
                    return split_by_syntax(chunk, tree.root_node(), self.config.ast_max_chars)
                }
                Err(err) => {
                    warn!(
                        "syntax split failed for {} ({}), falling back to line windows: {err}",
                        chunk.filepath,
                        language.as_str()
                    );
                }
            }
        }

        split_by_lines(chunk, self.config.line_max_chars)
    }
}

/// Old-side lines consumed by `lines[range_start..range_end]`: context and
/// deletion lines advance the old file, insertions and markers do not.
fn old_line_offset(lines: &[DiffLine], range_start: usize, range_end: usize) -> u32 {
    lines[range_start..range_end.min(lines.len())]
        .iter()
        .filter(|line| matches!(line.kind, LineKind::Context | LineKind::Deletion))
        .count() as u32
}

fn piece_template(chunk: &DiffChunk) -> DiffChunk {
    DiffChunk::new(chunk.filepath.clone(), chunk.old_filepath.clone())
}

fn split_by_syntax(chunk: &DiffChunk, root: Node<'_>, max_chars: usize) -> Vec<DiffChunk> {
    if chunk.lines.is_empty() {
        return Vec::new();
    }

    let points = split_points(root, &chunk.lines);

    let mut pieces: Vec<DiffChunk> = Vec::new();
    let mut current = piece_template(chunk);
    let mut current_size = 0;
    let mut current_start_idx = 0;

    for pair in points.windows(2) {
        let (seg_start, seg_end) = (pair[0], pair[1]);
        let segment = &chunk.lines[seg_start..seg_end];
        let segment_size = lines_byte_size(segment);

        if !current.lines.is_empty() && current_size + segment_size > max_chars {
            current.start = chunk.start + old_line_offset(&chunk.lines, 0, current_start_idx);
            pieces.push(current);
            current = piece_template(chunk);
            current_size = 0;
            current_start_idx = seg_start;
        }

        if current.lines.is_empty() {
            current_start_idx = seg_start;
        }

        current.lines.extend_from_slice(segment);
        current_size += segment_size;
    }

    if !current.lines.is_empty() {
        current.start = chunk.start + old_line_offset(&chunk.lines, 0, current_start_idx);
        pieces.push(current);
    }

    if let Some(first) = pieces.first_mut() {
        first.is_new = chunk.is_new;
    }
    if let Some(last) = pieces.last_mut() {
        last.is_deleted = chunk.is_deleted;
    }

    pieces
}

fn split_by_lines(chunk: &DiffChunk, max_chars: usize) -> Vec<DiffChunk> {
    if chunk.lines.is_empty() {
        return Vec::new();
    }

    if lines_byte_size(&chunk.lines) <= max_chars {
        return vec![chunk.clone()];
    }

    let mut pieces = Vec::new();
    let mut start_idx = 0;
    let mut cumulative_offset = 0;
    let mut is_first = true;

    while start_idx < chunk.lines.len() {
        let mut current = piece_template(chunk);
        current.start = chunk.start + cumulative_offset;
        current.is_new = is_first && chunk.is_new;

        let mut current_size = 0;
        let mut idx = start_idx;
        while idx < chunk.lines.len() {
            let line_size = chunk.lines[idx].content.len() + 1;
            if !current.lines.is_empty() && current_size + line_size > max_chars {
                break;
            }
            current.lines.push(chunk.lines[idx].clone());
            current_size += line_size;
            idx += 1;
        }

        let is_last = idx >= chunk.lines.len();
        current.is_deleted = is_last && chunk.is_deleted;
        pieces.push(current);

        if is_last {
            break;
        }

        cumulative_offset += old_line_offset(&chunk.lines, start_idx, idx);
        start_idx = idx;
        is_first = false;
    }

    pieces
}
