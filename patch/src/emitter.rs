//! Re-emission of [`DiffChunk`]s as standalone unified patches.
//!
//! Each chunk becomes its own single-hunk patch that applies independently,
//! so the hunk header carries the same start line on both sides. When several
//! chunks of one file are emitted in sequence, earlier chunks shift the line
//! numbers of later ones; [`render_patches`] tracks that drift with a
//! per-file cumulative-delta map keyed by the chunk's original start line.

use crate::model::{DiffChunk, LineKind};
use log::debug;
use std::collections::{BTreeMap, HashMap};

/// Render one chunk as a unified patch.
///
/// Returns an empty string for a chunk with no insertions or deletions.
/// A pure rename renders as the four-line `git diff` rename form.
pub fn render_patch(chunk: &DiffChunk, include_file_header: bool) -> String {
    let is_rename =
        chunk.old_filepath != chunk.filepath && !chunk.is_new && !chunk.is_deleted;

    if is_rename && chunk.lines.is_empty() {
        return format!(
            "diff --git a/{old} b/{new}\nsimilarity index 100%\nrename from {old}\nrename to {new}\n",
            old = chunk.old_filepath,
            new = chunk.filepath,
        );
    }

    let mut patch = String::new();

    if include_file_header {
        if is_rename {
            patch.push_str(&format!(
                "diff --git a/{old} b/{new}\nrename from {old}\nrename to {new}\n",
                old = chunk.old_filepath,
                new = chunk.filepath,
            ));
        }

        if chunk.is_new {
            patch.push_str("--- /dev/null\n");
        } else {
            patch.push_str(&format!("--- a/{}\n", chunk.old_filepath));
        }
        if chunk.is_deleted {
            patch.push_str("+++ /dev/null\n");
        } else {
            patch.push_str(&format!("+++ b/{}\n", chunk.filepath));
        }
    }

    if !chunk.has_changes() {
        return String::new();
    }

    let (old_count, new_count) = chunk.line_counts();
    // Same start on both sides: the patch is applied on its own, not as part
    // of the original multi-hunk diff.
    patch.push_str(&format!(
        "@@ -{start},{old_count} +{start},{new_count} @@\n",
        start = chunk.start,
    ));

    for line in &chunk.lines {
        match line.kind {
            LineKind::Context => {
                patch.push(' ');
                patch.push_str(&line.content);
            }
            LineKind::Insertion => {
                patch.push('+');
                patch.push_str(&line.content);
            }
            LineKind::Deletion => {
                patch.push('-');
                patch.push_str(&line.content);
            }
            LineKind::NoNewline => patch.push_str(&line.content),
        }
        patch.push('\n');
    }

    patch
}

fn render_delete_patch(filepath: &str) -> String {
    format!(
        "diff --git a/{filepath} b/{filepath}\ndeleted file mode 100644\n--- a/{filepath}\n+++ /dev/null\n"
    )
}

/// Render a sequence of chunks as patches meant to be applied in order.
///
/// The caller decides the order (typically cluster by cluster), with one
/// constraint: chunks of the same file must keep their original relative
/// order. Per file this function:
///
/// - shifts each printed hunk start by the cumulative line delta of the
///   chunks already emitted for that file,
/// - keeps `is_new` only on the file's first chunk so later chunks append to
///   the created file,
/// - appends a `deleted file mode` patch right after the file's last chunk
///   when the file is being removed,
/// - rewrites the paths of chunks that follow a rename, since the rename has
///   already happened in the applied stream.
///
/// The outer vector is index-aligned with the input: entry `i` holds the
/// patches chunk `i` contributes, in application order. Most chunks yield
/// one; a trivial chunk yields an empty string and the final chunk of a
/// deleted file carries the trailing delete patch as well.
pub fn render_patches(chunks: &[DiffChunk]) -> Vec<Vec<String>> {
    let mut patches: Vec<Vec<String>> = Vec::with_capacity(chunks.len());
    let mut renamed_files: HashMap<String, String> = HashMap::new();
    // Per file: original start line -> cumulative delta of applied hunks.
    let mut file_deltas: HashMap<String, BTreeMap<u32, i64>> = HashMap::new();

    let mut deleted_file_last_idx: HashMap<&str, usize> = HashMap::new();
    let mut new_file_first_idx: HashMap<&str, usize> = HashMap::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if chunk.is_deleted {
            deleted_file_last_idx.insert(chunk.filepath.as_str(), i);
        }
        if chunk.is_new {
            new_file_first_idx.entry(chunk.filepath.as_str()).or_insert(i);
        }
    }

    for (i, original) in chunks.iter().enumerate() {
        let mut chunk = original.clone();

        if let Some(new_path) = renamed_files.get(&chunk.old_filepath) {
            chunk.old_filepath = new_path.clone();
            chunk.filepath = new_path.clone();
        }

        if chunk.old_filepath != chunk.filepath && !chunk.is_new && !chunk.is_deleted {
            renamed_files.insert(chunk.old_filepath.clone(), chunk.filepath.clone());
        }

        let ends_deleted_file = original.is_deleted
            && deleted_file_last_idx.get(original.filepath.as_str()) == Some(&i);
        let filepath = chunk.filepath.clone();

        // Only the first chunk of a new file creates it; the rest append.
        if chunk.is_new && new_file_first_idx.get(original.filepath.as_str()) != Some(&i) {
            chunk.is_new = false;
        }
        // Deletion is a separate trailing patch, emitted below.
        chunk.is_deleted = false;

        let original_start = chunk.start;
        let deltas = file_deltas.entry(filepath.clone()).or_default();
        // Inclusive bound: chunks of one file keep their original relative
        // order, so a chunk sharing a start with an earlier insertion-only
        // chunk sits after it and must absorb its delta too.
        let adjustment = deltas
            .range(..=original_start)
            .next_back()
            .map(|(_, delta)| *delta)
            .unwrap_or(0);
        chunk.start = (i64::from(chunk.start) + adjustment) as u32;

        let mut rendered = vec![render_patch(&chunk, true)];

        let (old_count, new_count) = chunk.line_counts();
        let delta = i64::from(new_count) - i64::from(old_count);
        if delta != 0 {
            for (_, existing) in deltas.range_mut(original_start..) {
                *existing += delta;
            }
            deltas.insert(original_start, adjustment + delta);
        }

        if ends_deleted_file {
            debug!("appending delete patch for {filepath}");
            rendered.push(render_delete_patch(&filepath));
        }
        patches.push(rendered);
    }

    patches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DiffLine;
    use pretty_assertions::assert_eq;

    fn line(kind: LineKind, content: &str) -> DiffLine {
        DiffLine::new(kind, content, 0)
    }

    fn chunk(path: &str, start: u32, lines: Vec<DiffLine>) -> DiffChunk {
        let mut chunk = DiffChunk::new(path, path);
        chunk.start = start;
        chunk.lines = lines;
        chunk
    }

    #[test]
    fn renders_a_basic_hunk() {
        let chunk = chunk(
            "f.c",
            3,
            vec![
                line(LineKind::Context, "keep"),
                line(LineKind::Deletion, "old"),
                line(LineKind::Insertion, "new"),
            ],
        );
        assert_eq!(
            render_patch(&chunk, true),
            "--- a/f.c\n+++ b/f.c\n@@ -3,2 +3,2 @@\n keep\n-old\n+new\n"
        );
    }

    #[test]
    fn context_only_chunk_renders_empty() {
        let chunk = chunk("f.c", 1, vec![line(LineKind::Context, "same")]);
        assert_eq!(render_patch(&chunk, true), "");
    }

    #[test]
    fn pure_rename_renders_four_lines() {
        let mut chunk = DiffChunk::new("new.txt", "old.txt");
        chunk.is_rename = true;
        assert_eq!(
            render_patch(&chunk, true),
            "diff --git a/old.txt b/new.txt\nsimilarity index 100%\nrename from old.txt\nrename to new.txt\n"
        );
    }

    #[test]
    fn new_and_deleted_files_use_dev_null() {
        let mut created = chunk("f.py", 1, vec![line(LineKind::Insertion, "x = 1")]);
        created.is_new = true;
        assert!(render_patch(&created, true).starts_with("--- /dev/null\n+++ b/f.py\n"));

        let mut removed = chunk("f.py", 1, vec![line(LineKind::Deletion, "x = 1")]);
        removed.is_deleted = true;
        assert!(render_patch(&removed, true).starts_with("--- a/f.py\n+++ /dev/null\n"));
    }

    #[test]
    fn no_newline_marker_passes_through() {
        let chunk = chunk(
            "f",
            1,
            vec![
                line(LineKind::Deletion, "x"),
                line(LineKind::Insertion, "y"),
                line(LineKind::NoNewline, "\\ No newline at end of file"),
            ],
        );
        assert!(render_patch(&chunk, true).ends_with("+y\n\\ No newline at end of file\n"));
    }

    // Two hunks of one file in original order: the second printed start
    // shifts by the first hunk's +1 delta.
    #[test]
    fn later_hunks_of_a_file_absorb_earlier_deltas() {
        let first = chunk(
            "f.c",
            10,
            vec![
                line(LineKind::Context, "a"),
                line(LineKind::Context, "b"),
                line(LineKind::Insertion, "inserted"),
            ],
        );
        let second = chunk(
            "f.c",
            50,
            vec![line(LineKind::Deletion, "u"), line(LineKind::Insertion, "v")],
        );

        let patches = render_patches(&[first, second]);
        assert!(patches[0][0].contains("@@ -10,2 +10,3 @@"));
        assert!(patches[1][0].contains("@@ -51,1 +51,1 @@"));
    }

    #[test]
    fn chunks_of_other_files_between_do_not_shift() {
        let first = chunk("a.c", 10, vec![line(LineKind::Insertion, "x")]);
        let other = chunk("b.c", 10, vec![line(LineKind::Insertion, "y")]);
        let second = chunk(
            "a.c",
            50,
            vec![line(LineKind::Deletion, "u"), line(LineKind::Insertion, "v")],
        );

        let patches = render_patches(&[first, other, second]);
        assert!(patches[1][0].contains("@@ -10,0 +10,1 @@"));
        assert!(patches[2][0].contains("@@ -51,1 +51,1 @@"));
    }

    // A chunk that starts before an already-emitted one is not adjusted by
    // it; the delta map only looks at smaller start lines.
    #[test]
    fn earlier_region_emitted_later_keeps_its_start() {
        let high = chunk(
            "f.c",
            50,
            vec![line(LineKind::Deletion, "u"), line(LineKind::Insertion, "v")],
        );
        let low = chunk(
            "f.c",
            10,
            vec![line(LineKind::Context, "a"), line(LineKind::Insertion, "ins")],
        );

        let patches = render_patches(&[high, low]);
        assert!(patches[0][0].contains("@@ -50,1 +50,1 @@"));
        assert!(patches[1][0].contains("@@ -10,1 +10,2 @@"));
    }

    #[test]
    fn deltas_accumulate_across_three_hunks() {
        let chunks = vec![
            chunk(
                "f.c",
                5,
                vec![line(LineKind::Insertion, "a"), line(LineKind::Insertion, "b")],
            ),
            chunk("f.c", 20, vec![line(LineKind::Deletion, "c")]),
            chunk("f.c", 40, vec![line(LineKind::Insertion, "d")]),
        ];
        let patches = render_patches(&chunks);
        assert!(patches[0][0].contains("@@ -5,0 +5,2 @@"));
        // +2 from the first hunk.
        assert!(patches[1][0].contains("@@ -22,1 +22,0 @@"));
        // +2 - 1 = +1 cumulative.
        assert!(patches[2][0].contains("@@ -41,0 +41,1 @@"));
    }

    #[test]
    fn only_first_chunk_of_new_file_creates_it() {
        let mut part1 = chunk("new.py", 0, vec![line(LineKind::Insertion, "a")]);
        part1.is_new = true;
        let mut part2 = chunk("new.py", 0, vec![line(LineKind::Insertion, "b")]);
        part2.is_new = true;

        let patches = render_patches(&[part1, part2]);
        assert!(patches[0][0].starts_with("--- /dev/null\n"));
        assert!(patches[1][0].starts_with("--- a/new.py\n"));
    }

    // Windows of a new file all carry the same old-side start; each printed
    // start must still advance past the lines the previous windows added, so
    // applying them in order appends instead of prepending.
    #[test]
    fn new_file_windows_append_in_order() {
        let window = |contents: &[&str]| {
            chunk(
                "new.py",
                0,
                contents.iter().map(|c| line(LineKind::Insertion, c)).collect(),
            )
        };
        let mut first = window(&["a", "b"]);
        first.is_new = true;
        let mut second = window(&["c", "d"]);
        second.is_new = true;
        let mut third = window(&["e", "f"]);
        third.is_new = true;

        let patches = render_patches(&[first, second, third]);
        assert!(patches[0][0].contains("@@ -0,0 +0,2 @@"));
        assert!(patches[1][0].contains("@@ -2,0 +2,2 @@"));
        assert!(patches[2][0].contains("@@ -4,0 +4,2 @@"));
    }

    #[test]
    fn delete_patch_follows_last_chunk_of_deleted_file() {
        let mut part1 = chunk("gone.py", 1, vec![line(LineKind::Deletion, "a")]);
        part1.is_deleted = true;
        let mut part2 = chunk("gone.py", 2, vec![line(LineKind::Deletion, "b")]);
        part2.is_deleted = true;

        let patches = render_patches(&[part1, part2]);
        assert_eq!(patches.len(), 2);
        // Content patches target the still-existing file.
        assert!(patches[0][0].starts_with("--- a/gone.py\n+++ b/gone.py\n"));
        assert_eq!(patches[0].len(), 1);
        assert!(patches[1][0].starts_with("--- a/gone.py\n+++ b/gone.py\n"));
        // The last chunk of the deleted file carries the trailing delete patch.
        assert_eq!(
            patches[1][1],
            "diff --git a/gone.py b/gone.py\ndeleted file mode 100644\n--- a/gone.py\n+++ /dev/null\n"
        );
    }

    #[test]
    fn chunks_after_a_rename_use_the_new_path() {
        let mut rename = DiffChunk::new("new.rs", "old.rs");
        rename.is_rename = true;
        let followup = {
            let mut c = DiffChunk::new("old.rs", "old.rs");
            c.start = 4;
            c.lines = vec![line(LineKind::Deletion, "x"), line(LineKind::Insertion, "y")];
            c
        };

        let patches = render_patches(&[rename, followup]);
        assert!(patches[0][0].contains("rename to new.rs"));
        assert!(patches[1][0].starts_with("--- a/new.rs\n+++ b/new.rs\n"));
    }

    #[test]
    fn round_trips_a_parsed_diff() {
        let diff = "\
--- a/src/lib.rs
+++ b/src/lib.rs
@@ -10,3 +10,4 @@
 unchanged
-removed
+added
+also added
 tail
";
        let chunks = crate::DiffParser::parse(&format!(
            "diff --git a/src/lib.rs b/src/lib.rs\n{diff}"
        ));
        assert_eq!(render_patch(&chunks[0], true), diff);
    }
}
