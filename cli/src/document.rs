//! Wire types for the two JSON documents the tool emits.
//!
//! Merge mode writes a [`MergeDocument`] holding the dendrogram and the full
//! chunk list, so that threshold mode can regroup and re-emit patches
//! without re-reading the diff or re-embedding anything. Threshold mode
//! writes a [`ThresholdDocument`] describing the commits and the
//! visualization.

use clap::ValueEnum;
use gcommit_clustering::Dendrogram;
use gcommit_openai::utf8_truncate;
use gcommit_patch::DiffChunk;
use serde::{Deserialize, Serialize};

const PREVIEW_MAX_BYTES: usize = 100;

/// Clustering engine recorded in the merge document, so threshold mode cuts
/// the merge list the way it was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterAlgorithm {
    /// Single-linkage agglomerative clustering (full dendrogram).
    #[default]
    Hac,
    /// Mutual-reachability spanning tree with epsilon extraction.
    Hdbscan,
}

/// One chunk in the merge document, with its clustering index and
/// visualization coordinates alongside the chunk fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    #[serde(flatten)]
    pub chunk: DiffChunk,
    pub index: usize,
    pub umap_x: f32,
    pub umap_y: f32,
    pub preview: String,
}

/// Output of merge mode; input of threshold mode.
#[derive(Debug, Serialize, Deserialize)]
pub struct MergeDocument {
    pub dendrogram: Dendrogram,
    #[serde(default)]
    pub algorithm: ClusterAlgorithm,
    pub chunks: Vec<ChunkRecord>,
}

#[derive(Debug, Serialize)]
pub struct CommitEntry {
    pub cluster_id: usize,
    pub patch_files: Vec<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct PointRecord {
    pub id: usize,
    pub x: f32,
    pub y: f32,
    pub cluster_id: i64,
    pub filepath: String,
    pub preview: String,
}

#[derive(Debug, Serialize)]
pub struct ClusterRecord {
    pub id: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct Visualization {
    pub points: Vec<PointRecord>,
    pub clusters: Vec<ClusterRecord>,
}

/// Output of threshold mode.
#[derive(Debug, Serialize)]
pub struct ThresholdDocument {
    pub commits: Vec<CommitEntry>,
    pub visualization: Visualization,
}

/// Text sent to the embedder for a chunk. Pure renames and empty chunks get
/// a descriptive stand-in since they carry no content.
pub fn embedding_text(chunk: &DiffChunk) -> String {
    if chunk.is_rename {
        return format!(
            "renamed file from {} to {}",
            chunk.old_filepath, chunk.filepath
        );
    }
    let content = chunk.combined_content();
    if content.is_empty() {
        return format!("file: {}", chunk.filepath);
    }
    content
}

/// Short content preview for the visualization.
pub fn preview(chunk: &DiffChunk) -> String {
    let content = chunk.combined_content();
    if content.len() > PREVIEW_MAX_BYTES {
        format!("{}...", utf8_truncate(&content, PREVIEW_MAX_BYTES))
    } else {
        content
    }
}
