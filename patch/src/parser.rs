//! Lenient single-pass parser for `git diff` output.
//!
//! The parser is a small state machine over the input lines: outside any
//! file, inside a file header, or inside a hunk. Unknown lines outside a
//! hunk are ignored so that index lines, mode lines and similarity scores
//! never trip it up. It never fails; a malformed hunk header falls back to
//! `start = 1`.

use crate::model::{DiffChunk, DiffLine, LineKind};
use log::debug;

const DIFF_HEADER: &str = "diff --git a/";
const DELETED_FILE: &str = "deleted file mode";
const NEW_FILE: &str = "new file mode";
const HUNK_HEADER: &str = "@@";

/// Streaming parser for unified diffs.
///
/// Feed lines with [`DiffParser::push_line`] and collect the result with
/// [`DiffParser::finish`], or parse a whole buffer with [`DiffParser::parse`].
#[derive(Debug, Default)]
pub struct DiffParser {
    in_file: bool,
    in_hunk: bool,
    line_num: u32,
    filepath: String,
    old_filepath: String,
    is_deleted: bool,
    is_new: bool,
    chunks: Vec<DiffChunk>,
}

impl DiffParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a complete diff buffer.
    pub fn parse(input: &str) -> Vec<DiffChunk> {
        let mut parser = Self::new();
        for line in input.lines() {
            parser.push_line(line);
        }
        parser.finish()
    }

    /// A `diff --git` header with differing paths and no hunks is a pure
    /// rename; emit it before moving on to the next file.
    fn flush_pending_rename(&mut self) {
        if self.in_file && !self.in_hunk && self.old_filepath != self.filepath {
            debug!(
                "pure rename detected: {} -> {}",
                self.old_filepath, self.filepath
            );
            let mut chunk = DiffChunk::new(self.filepath.clone(), self.old_filepath.clone());
            chunk.is_rename = true;
            self.chunks.push(chunk);
        }
    }

    /// Consume one line of diff input (without its trailing newline).
    pub fn push_line(&mut self, line: &str) {
        if let Some((old_path, new_path)) = parse_diff_header(line) {
            self.flush_pending_rename();
            self.old_filepath = old_path.to_string();
            self.filepath = new_path.to_string();
            self.is_deleted = false;
            self.is_new = false;
            self.in_file = true;
            self.in_hunk = false;
            return;
        }

        if self.in_file && line.starts_with(DELETED_FILE) {
            self.is_deleted = true;
            return;
        }

        if self.in_file && line.starts_with(NEW_FILE) {
            self.is_new = true;
            return;
        }

        if self.in_file && line.starts_with(HUNK_HEADER) {
            self.in_hunk = true;
            self.line_num = 0;

            let mut chunk = DiffChunk::new(self.filepath.clone(), self.old_filepath.clone());
            chunk.is_deleted = self.is_deleted;
            chunk.is_new = self.is_new;
            chunk.start = parse_hunk_start(line).unwrap_or(1);
            self.chunks.push(chunk);
            return;
        }

        if self.in_file && self.in_hunk {
            let parsed = match line.as_bytes().first().copied() {
                Some(b'+') => Some(DiffLine::new(LineKind::Insertion, &line[1..], self.line_num)),
                Some(b'-') => Some(DiffLine::new(LineKind::Deletion, &line[1..], self.line_num)),
                Some(b' ') => Some(DiffLine::new(LineKind::Context, &line[1..], self.line_num)),
                // `\ No newline at end of file` markers are kept verbatim.
                Some(b'\\') => Some(DiffLine::new(LineKind::NoNewline, line, self.line_num)),
                _ => None,
            };
            if let (Some(diff_line), Some(chunk)) = (parsed, self.chunks.last_mut()) {
                chunk.lines.push(diff_line);
                self.line_num += 1;
            }
        }
    }

    /// Flush any pending rename and return the parsed chunks.
    pub fn finish(mut self) -> Vec<DiffChunk> {
        self.flush_pending_rename();
        self.chunks
    }
}

/// `diff --git a/<old> b/<new>` -> `(old, new)`.
fn parse_diff_header(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix(DIFF_HEADER)?;
    let sep = rest.find(" b/")?;
    Some((&rest[..sep], &rest[sep + 3..]))
}

/// Old-side start of `@@ -S[,L] +S'[,L'] @@`.
fn parse_hunk_start(line: &str) -> Option<u32> {
    let rest = line.strip_prefix("@@ -")?;
    let end = rest.find(|c: char| c == ',' || c == ' ')?;
    rest[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SIMPLE_DIFF: &str = "\
diff --git a/src/lib.rs b/src/lib.rs
index 1234567..89abcde 100644
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -10,3 +10,4 @@ fn context()
 unchanged
-removed
+added
+also added
";

    #[test]
    fn parses_a_single_hunk() {
        let chunks = DiffParser::parse(SIMPLE_DIFF);
        assert_eq!(chunks.len(), 1);

        let chunk = &chunks[0];
        assert_eq!(chunk.filepath, "src/lib.rs");
        assert_eq!(chunk.old_filepath, "src/lib.rs");
        assert_eq!(chunk.start, 10);
        assert!(!chunk.is_new && !chunk.is_deleted && !chunk.is_rename);

        let kinds: Vec<LineKind> = chunk.lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Context,
                LineKind::Deletion,
                LineKind::Insertion,
                LineKind::Insertion,
            ]
        );
        assert_eq!(chunk.lines[1].content, "removed");
        assert_eq!(chunk.lines[3].line_num, 3);
    }

    #[test]
    fn pure_rename_emits_an_empty_chunk() {
        let diff = "diff --git a/old.txt b/new.txt\n";
        let chunks = DiffParser::parse(diff);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_rename);
        assert!(chunks[0].lines.is_empty());
        assert_eq!(chunks[0].old_filepath, "old.txt");
        assert_eq!(chunks[0].filepath, "new.txt");
    }

    #[test]
    fn rename_followed_by_another_file_is_flushed() {
        let diff = "\
diff --git a/old.txt b/new.txt
similarity index 100%
rename from old.txt
rename to new.txt
diff --git a/other.c b/other.c
--- a/other.c
+++ b/other.c
@@ -1,1 +1,1 @@
-x
+y
";
        let chunks = DiffParser::parse(diff);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_rename);
        assert_eq!(chunks[1].filepath, "other.c");
    }

    #[test]
    fn new_and_deleted_file_modes_set_flags() {
        let diff = "\
diff --git a/created.py b/created.py
new file mode 100644
--- /dev/null
+++ b/created.py
@@ -1,0 +1,2 @@
+a = 1
+b = 2
diff --git a/gone.py b/gone.py
deleted file mode 100644
--- a/gone.py
+++ /dev/null
@@ -1,1 +1,0 @@
-old = 0
";
        let chunks = DiffParser::parse(diff);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_new);
        assert!(!chunks[0].is_deleted);
        assert!(chunks[1].is_deleted);
        assert!(!chunks[1].is_new);
    }

    #[test]
    fn no_newline_marker_is_kept_verbatim() {
        let diff = "\
diff --git a/f b/f
--- a/f
+++ b/f
@@ -1,1 +1,1 @@
-x
+y
\\ No newline at end of file
";
        let chunks = DiffParser::parse(diff);
        let last = chunks[0].lines.last().unwrap();
        assert_eq!(last.kind, LineKind::NoNewline);
        assert_eq!(last.content, "\\ No newline at end of file");
    }

    #[test]
    fn malformed_hunk_header_defaults_start_to_one() {
        let diff = "\
diff --git a/f b/f
@@ -bogus +range @@
+x
";
        let chunks = DiffParser::parse(diff);
        assert_eq!(chunks[0].start, 1);
        assert_eq!(chunks[0].lines.len(), 1);
    }

    #[test]
    fn hunk_start_without_count_is_accepted() {
        assert_eq!(parse_hunk_start("@@ -7 +7 @@"), Some(7));
        assert_eq!(parse_hunk_start("@@ -12,3 +12,4 @@ fn ctx()"), Some(12));
        assert_eq!(parse_hunk_start("not a hunk"), None);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(DiffParser::parse("").is_empty());
    }

    #[test]
    fn line_numbers_restart_per_chunk() {
        let diff = "\
diff --git a/f b/f
--- a/f
+++ b/f
@@ -1,1 +1,1 @@
-a
+b
@@ -10,1 +10,1 @@
-c
+d
";
        let chunks = DiffParser::parse(diff);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].lines[0].line_num, 0);
        assert_eq!(chunks[1].lines[0].line_num, 0);
        assert_eq!(chunks[1].lines[1].line_num, 1);
    }
}
