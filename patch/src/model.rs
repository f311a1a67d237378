use serde::{Deserialize, Serialize};

/// Kind of a single line inside a diff hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// Context line present on both sides (` ` sigil).
    Context,
    /// Line added on the new side (`+` sigil).
    Insertion,
    /// Line removed from the old side (`-` sigil).
    Deletion,
    /// A `\ No newline at end of file` marker, kept verbatim.
    NoNewline,
}

/// One line of a diff hunk, without its leading sigil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: LineKind,
    pub content: String,
    /// Position of the line within its parent chunk, assigned at parse time.
    pub line_num: u32,
}

impl DiffLine {
    pub fn new(kind: LineKind, content: impl Into<String>, line_num: u32) -> Self {
        Self {
            kind,
            content: content.into(),
            line_num,
        }
    }
}

fn default_start() -> u32 {
    1
}

/// A contiguous region of a diff belonging to one file.
///
/// Originally one `@@` hunk; the chunker may subdivide it further. `start` is
/// the 1-based line number on the old side of the file where the chunk
/// begins. A pure rename carries no lines and differing paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffChunk {
    /// New path (same as `old_filepath` when the file was not renamed).
    pub filepath: String,
    /// Old path from the `a/` side of the diff header.
    pub old_filepath: String,
    #[serde(default = "default_start")]
    pub start: u32,
    #[serde(default)]
    pub lines: Vec<DiffLine>,
    /// File is being created; the chunk's patch starts from `/dev/null`.
    #[serde(default)]
    pub is_new: bool,
    /// File is being deleted once this chunk has been applied.
    #[serde(default)]
    pub is_deleted: bool,
    /// Pure rename with no content change.
    #[serde(default)]
    pub is_rename: bool,
}

impl DiffChunk {
    pub fn new(filepath: impl Into<String>, old_filepath: impl Into<String>) -> Self {
        Self {
            filepath: filepath.into(),
            old_filepath: old_filepath.into(),
            start: 1,
            lines: Vec::new(),
            is_new: false,
            is_deleted: false,
            is_rename: false,
        }
    }

    /// Line contents joined with newlines, one per line.
    ///
    /// This is the text handed to the syntax parser and the embedder; diff
    /// sigils are already stripped.
    pub fn combined_content(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.content);
            out.push('\n');
        }
        out
    }

    /// `(old_count, new_count)` for the hunk header: context plus deletions
    /// on the old side, context plus insertions on the new side.
    pub fn line_counts(&self) -> (u32, u32) {
        let mut old_count = 0;
        let mut new_count = 0;
        for line in &self.lines {
            match line.kind {
                LineKind::Context => {
                    old_count += 1;
                    new_count += 1;
                }
                LineKind::Deletion => old_count += 1,
                LineKind::Insertion => new_count += 1,
                LineKind::NoNewline => {}
            }
        }
        (old_count, new_count)
    }

    /// Whether the chunk carries at least one insertion or deletion.
    /// Context-only chunks emit no patch.
    pub fn has_changes(&self) -> bool {
        self.lines
            .iter()
            .any(|l| matches!(l.kind, LineKind::Insertion | LineKind::Deletion))
    }
}
