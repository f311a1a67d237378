//! Threshold mode: cut the stored dendrogram, write per-cluster patch files,
//! and describe the resulting commits.

use crate::document::{
    ClusterAlgorithm, ClusterRecord, CommitEntry, MergeDocument, PointRecord, ThresholdDocument,
    Visualization,
};
use anyhow::{Context, Result};
use futures::future::join_all;
use gcommit_clustering::{cut_at_threshold, epsilon_cut, MstEdge};
use gcommit_openai::OpenAiClient;
use gcommit_patch::{render_patches, DiffChunk};
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

/// Where the patch files go. Cleared on every run.
pub const SCRATCH_DIR: &str = "/tmp/gcommit";

/// Components smaller than this dissolve into noise when cutting an
/// HDBSCAN merge list.
const MIN_CLUSTER_SIZE: usize = 2;

const SUMMARY_FAILURE_MESSAGE: &str = "update code";
const EMPTY_COMMIT_MESSAGE: &str = "empty commit";

pub async fn run(threshold: f32, merge_json: &Path) -> Result<()> {
    let client = OpenAiClient::from_env()?;

    let raw = fs::read_to_string(merge_json)
        .with_context(|| format!("failed to read {}", merge_json.display()))?;
    let document: MergeDocument =
        serde_json::from_str(&raw).context("failed to parse merge-mode JSON")?;

    let leaf_count = document.chunks.len();
    let clusters = match document.algorithm {
        ClusterAlgorithm::Hac => {
            cut_at_threshold(leaf_count, &document.dendrogram.merges, threshold)
        }
        ClusterAlgorithm::Hdbscan => {
            let edges: Vec<MstEdge> = document
                .dendrogram
                .merges
                .iter()
                .map(|merge| MstEdge {
                    a: merge.left.min(merge.right),
                    b: merge.left.max(merge.right),
                    distance: merge.distance,
                })
                .collect();
            epsilon_cut(leaf_count, &edges, threshold, MIN_CLUSTER_SIZE)
        }
    };
    info!(
        "{} clusters at threshold {threshold} over {leaf_count} chunks",
        clusters.len()
    );

    let chunk_to_cluster = cluster_assignment(leaf_count, &clusters);

    // Per-file line drift must accumulate across cluster boundaries, so all
    // chunks are rendered in one pass, in final application order.
    let mut ordered_chunks: Vec<DiffChunk> = Vec::with_capacity(leaf_count);
    let mut cluster_ranges = Vec::with_capacity(clusters.len());
    for cluster in &clusters {
        let start = ordered_chunks.len();
        for &index in cluster {
            ordered_chunks.push(document.chunks[index].chunk.clone());
        }
        cluster_ranges.push(start..ordered_chunks.len());
    }
    let rendered = render_patches(&ordered_chunks);

    let scratch = Path::new(SCRATCH_DIR);
    if scratch.exists() {
        fs::remove_dir_all(scratch)
            .with_context(|| format!("failed to clear {}", scratch.display()))?;
    }

    let mut commits = Vec::new();
    let mut summary_inputs = Vec::new();
    for (cluster_id, range) in cluster_ranges.into_iter().enumerate() {
        let cluster_dir = scratch.join(format!("cluster_{cluster_id}"));
        fs::create_dir_all(&cluster_dir)
            .with_context(|| format!("failed to create {}", cluster_dir.display()))?;

        let mut patch_files = Vec::new();
        let mut patch_bodies = Vec::new();
        let mut patch_num = 0;
        for patch in rendered[range].iter().flatten() {
            if patch.is_empty() {
                debug!("skipping empty patch in cluster {cluster_id}");
                continue;
            }
            let path = cluster_dir.join(format!("patch_{patch_num}.patch"));
            fs::write(&path, patch)
                .with_context(|| format!("failed to write {}", path.display()))?;
            patch_files.push(path.to_string_lossy().into_owned());
            patch_bodies.push(patch.clone());
            patch_num += 1;
        }

        if patch_files.is_empty() {
            info!("skipping cluster {cluster_id}: no non-trivial patches");
            continue;
        }

        summary_inputs.push(build_diff_context(&patch_bodies));
        commits.push(CommitEntry {
            cluster_id,
            patch_files,
            message: EMPTY_COMMIT_MESSAGE.to_string(),
        });
    }

    summarize_all(&client, &summary_inputs, &mut commits).await;

    let points = document
        .chunks
        .iter()
        .map(|record| PointRecord {
            id: record.index,
            x: record.umap_x,
            y: record.umap_y,
            cluster_id: chunk_to_cluster
                .get(record.index)
                .copied()
                .unwrap_or(-1),
            filepath: record.chunk.filepath.clone(),
            preview: record.preview.clone(),
        })
        .collect();
    let cluster_records = commits
        .iter()
        .map(|commit| ClusterRecord {
            id: commit.cluster_id,
            message: commit.message.clone(),
        })
        .collect();

    let output = ThresholdDocument {
        commits,
        visualization: Visualization {
            points,
            clusters: cluster_records,
        },
    };
    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

fn cluster_assignment(leaf_count: usize, clusters: &[Vec<usize>]) -> Vec<i64> {
    let mut assignment = vec![-1; leaf_count];
    for (cluster_id, members) in clusters.iter().enumerate() {
        for &index in members {
            if let Some(slot) = assignment.get_mut(index) {
                *slot = cluster_id as i64;
            }
        }
    }
    assignment
}

/// Concatenate patch bodies into the summarizer's context: insertions and
/// deletions are labeled so the model sees the direction of each change.
fn build_diff_context(patches: &[String]) -> String {
    let mut context = String::new();
    for patch in patches {
        for line in patch.lines() {
            if line.starts_with('+') {
                context.push_str("Insertion: ");
            } else if line.starts_with('-') {
                context.push_str("Deletion: ");
            }
            context.push_str(line);
            context.push('\n');
        }
        context.push_str("\n\n\n");
    }
    context
}

/// Request every commit message, then wait for the whole batch; responses
/// are joined back in submission order. Failures degrade to a stock
/// message.
async fn summarize_all(client: &OpenAiClient, inputs: &[String], commits: &mut [CommitEntry]) {
    info!("requesting commit messages for {} clusters", inputs.len());
    let requests = inputs.iter().map(|context| client.summarize(context));
    for (commit, result) in commits.iter_mut().zip(join_all(requests).await) {
        commit.message = match result {
            Ok(message) => message,
            Err(err) => {
                warn!("summarization failed for cluster {}: {err}", commit.cluster_id);
                SUMMARY_FAILURE_MESSAGE.to_string()
            }
        };
    }
}
