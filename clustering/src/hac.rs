//! Single-linkage agglomerative clustering with a full merge history.
//!
//! Rather than stopping at a threshold, [`single_linkage`] records every
//! merge it performs. The resulting dendrogram can then be cut at any
//! threshold with [`cut_at_threshold`] without touching the embeddings
//! again.

use crate::union_find::UnionFind;
use serde::{Deserialize, Serialize};

/// One merge performed by the clustering: the representatives of the two
/// sets joined, and the single-linkage distance at which they met.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MergeEvent {
    pub left: usize,
    pub right: usize,
    pub distance: f32,
}

/// Merge history over a set of labeled leaves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dendrogram {
    /// One label per leaf, conventionally the chunk's file path.
    pub labels: Vec<String>,
    /// Merges in the order they happened; distances are non-decreasing.
    pub merges: Vec<MergeEvent>,
    /// Distance of the final merge, for scaling visualizations.
    pub max_distance: f32,
}

impl Dendrogram {
    pub fn new(labels: Vec<String>, merges: Vec<MergeEvent>) -> Self {
        let max_distance = merges.last().map(|m| m.distance).unwrap_or(0.0);
        Self {
            labels,
            merges,
            max_distance,
        }
    }

    pub fn leaf_count(&self) -> usize {
        self.labels.len()
    }
}

/// Cosine distance `1 - dot(a, b)` between unit vectors.
///
/// An empty or mismatched vector (a failed embedding) is treated as sitting
/// at distance 1.0 from everything, so it merges last and stays a singleton
/// under any practical threshold.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 1.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    1.0 - dot
}

/// Pairwise cosine-distance matrix.
pub(crate) fn distance_matrix(data: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let n = data.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = cosine_distance(&data[i], &data[j]);
            matrix[i][j] = d;
            matrix[j][i] = d;
        }
    }
    matrix
}

/// Run single-linkage clustering over unit vectors, returning the `n - 1`
/// merges in the order they happened.
pub fn single_linkage(data: &[Vec<f32>]) -> Vec<MergeEvent> {
    single_linkage_from_distances(&distance_matrix(data))
}

/// Single-linkage clustering over a precomputed symmetric distance matrix.
///
/// Each round selects the globally smallest edge between two different
/// sets, which is exactly the single-linkage inter-cluster distance
/// (Kruskal on the complete graph). Ties go to the smaller `i`, then the
/// smaller `j`, so the output is reproducible. The recorded ids are the
/// pre-merge set representatives. `n <= 1` produces no merges.
pub fn single_linkage_from_distances(matrix: &[Vec<f32>]) -> Vec<MergeEvent> {
    let n = matrix.len();
    let mut merges = Vec::new();
    if n < 2 {
        return merges;
    }

    let mut uf = UnionFind::new(n);

    for _ in 0..(n - 1) {
        let mut best: Option<(usize, usize, f32)> = None;
        for i in 0..n {
            for j in (i + 1)..n {
                if uf.connected(i, j) {
                    continue;
                }
                let d = matrix[i][j];
                if best.map(|(_, _, bd)| d < bd).unwrap_or(true) {
                    best = Some((i, j, d));
                }
            }
        }

        let Some((i, j, distance)) = best else { break };
        merges.push(MergeEvent {
            left: uf.find(i),
            right: uf.find(j),
            distance,
        });
        uf.unite(i, j);
    }

    merges
}

/// Flat clusters from a merge history: replay merges with `distance <= t`
/// and collect the resulting sets, ordered by smallest member.
pub fn cut_at_threshold(
    leaf_count: usize,
    merges: &[MergeEvent],
    threshold: f32,
) -> Vec<Vec<usize>> {
    let mut uf = UnionFind::new(leaf_count);
    for merge in merges {
        if merge.distance <= threshold {
            uf.unite(merge.left, merge.right);
        }
    }
    uf.sets()
}
