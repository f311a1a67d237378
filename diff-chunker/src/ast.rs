//! Tree-sitter plumbing: cached parsers and split-point computation.
//!
//! The chunk's combined line content is parsed as source code; the byte
//! range of each direct child of the root node is translated back to a line
//! index, and the line after the child's last line becomes a candidate split
//! point.

use crate::error::{ChunkerError, Result};
use crate::language::Language;
use gcommit_patch::DiffLine;
use once_cell::sync::Lazy;
use std::sync::Mutex;
use tree_sitter::{Node, Parser, Tree};

macro_rules! cached_parser {
    ($name:ident, $lang:expr, $label:literal) => {
        static $name: Lazy<Mutex<Parser>> = Lazy::new(|| {
            let mut parser = Parser::new();
            if let Err(err) = parser.set_language(&$lang) {
                panic!("failed to load {} grammar: {err}", $label);
            }
            Mutex::new(parser)
        });
    };
}

cached_parser!(PYTHON, tree_sitter_python::LANGUAGE.into(), "python");
cached_parser!(CPP, tree_sitter_cpp::LANGUAGE.into(), "cpp");
cached_parser!(JAVA, tree_sitter_java::LANGUAGE.into(), "java");
cached_parser!(
    JAVASCRIPT,
    tree_sitter_javascript::LANGUAGE.into(),
    "javascript"
);
cached_parser!(
    TYPESCRIPT,
    tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
    "typescript"
);
cached_parser!(GO, tree_sitter_go::LANGUAGE.into(), "go");

fn cached_parser_for(language: Language) -> Result<&'static Lazy<Mutex<Parser>>> {
    match language {
        Language::Python => Ok(&PYTHON),
        Language::Cpp => Ok(&CPP),
        Language::Java => Ok(&JAVA),
        Language::JavaScript => Ok(&JAVASCRIPT),
        Language::TypeScript => Ok(&TYPESCRIPT),
        Language::Go => Ok(&GO),
        Language::Text => Err(ChunkerError::unsupported_language(language.as_str())),
    }
}

/// Parse source code with the cached parser for `language`.
pub(crate) fn parse_source(language: Language, source: &str) -> Result<Tree> {
    let parser = cached_parser_for(language)?;
    let mut parser = parser
        .lock()
        .map_err(|_| ChunkerError::parse(format!("failed to lock {} parser", language.as_str())))?;
    parser
        .parse(source, None)
        .ok_or_else(|| ChunkerError::parse(format!("failed to parse {} source", language.as_str())))
}

/// Total byte size of the lines, counting one newline per line.
pub(crate) fn lines_byte_size(lines: &[DiffLine]) -> usize {
    lines.iter().map(|line| line.content.len() + 1).sum()
}

/// Index of the line containing `byte_pos` in the concatenated content.
pub(crate) fn byte_to_line_index(lines: &[DiffLine], byte_pos: usize) -> usize {
    let mut current = 0;
    for (i, line) in lines.iter().enumerate() {
        let line_end = current + line.content.len() + 1;
        if byte_pos < line_end {
            return i;
        }
        current = line_end;
    }
    lines.len().saturating_sub(1)
}

/// Split points derived from the root node's direct children.
///
/// Strictly increasing, beginning with 0 and ending with `lines.len()`.
/// Splitting after the line where a child ends keeps whole top-level
/// definitions inside one piece.
pub(crate) fn split_points(root: Node<'_>, lines: &[DiffLine]) -> Vec<usize> {
    let mut points = vec![0];

    for i in 0..root.child_count() {
        let Some(child) = root.child(i) else { continue };
        let end_line = byte_to_line_index(lines, child.end_byte());
        let point = end_line + 1;
        if point > *points.last().unwrap_or(&0) && point <= lines.len() {
            points.push(point);
        }
    }

    if *points.last().unwrap_or(&0) < lines.len() {
        points.push(lines.len());
    }

    points
}
