//! HDBSCAN-style clustering: core distances, a mutual-reachability minimum
//! spanning tree, and flat extraction at an epsilon.
//!
//! The mutual-reachability distance `max(core(a), core(b), d(a, b))` smooths
//! out sparse regions before the spanning tree is built, so isolated points
//! attach late and fall out as noise. Cutting the sorted tree at an epsilon
//! and dissolving undersized components gives the flat clustering.

use crate::hac::distance_matrix;
use crate::union_find::UnionFind;
use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One edge of the mutual-reachability spanning tree, canonicalized so that
/// `a < b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MstEdge {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
}

/// Knobs for the engine.
#[derive(Debug, Clone, Copy)]
pub struct HdbscanConfig {
    /// Components smaller than this dissolve into per-point noise clusters.
    pub min_cluster_size: usize,
    /// `k` for the core distance (k-th nearest neighbor).
    pub min_pts: usize,
}

impl Default for HdbscanConfig {
    fn default() -> Self {
        Self {
            min_cluster_size: 2,
            min_pts: 2,
        }
    }
}

/// The fitted engine: spanning tree, default epsilon, and the flat
/// clustering extracted at it.
#[derive(Debug, Default)]
pub struct Hdbscan {
    config: HdbscanConfig,
    num_points: usize,
    mst: Vec<MstEdge>,
    default_epsilon: f32,
    clusters: Vec<Vec<usize>>,
    labels: Vec<i32>,
}

impl Hdbscan {
    pub fn new(config: HdbscanConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Build the spanning tree over the data and extract clusters at the
    /// default epsilon (midpoint of the edge-weight range).
    pub fn fit(&mut self, data: &[Vec<f32>]) {
        self.num_points = data.len();
        self.mst.clear();
        self.clusters.clear();
        self.labels.clear();
        self.default_epsilon = 0.0;

        if data.is_empty() {
            return;
        }

        let distances = distance_matrix(data);
        let core = core_distances(&distances, self.config.min_pts);
        self.mst = build_mst_prim(&distances, &core);

        if let (Some(first), Some(last)) = (self.mst.first(), self.mst.last()) {
            self.default_epsilon = first.distance + (last.distance - first.distance) * 0.5;
        }
        debug!(
            "hdbscan: {} points, {} edges, default epsilon {:.4}",
            self.num_points,
            self.mst.len(),
            self.default_epsilon
        );

        self.clusters = epsilon_cut(
            self.num_points,
            &self.mst,
            self.default_epsilon,
            self.config.min_cluster_size,
        );

        self.labels = vec![-1; self.num_points];
        for (cluster_id, members) in self.clusters.iter().enumerate() {
            // Noise points keep -1: their singleton clusters are appended
            // after the real ones, and a single point is below any
            // min_cluster_size >= 2.
            if members.len() >= self.config.min_cluster_size {
                for &idx in members {
                    self.labels[idx] = cluster_id as i32;
                }
            }
        }
    }

    pub fn clusters(&self) -> &[Vec<usize>] {
        &self.clusters
    }

    /// Per-point cluster labels; noise points carry `-1`.
    pub fn labels(&self) -> &[i32] {
        &self.labels
    }

    pub fn mst(&self) -> &[MstEdge] {
        &self.mst
    }

    pub fn default_epsilon(&self) -> f32 {
        self.default_epsilon
    }

    /// Re-extract the flat clustering at a different epsilon without
    /// recomputing the spanning tree.
    pub fn clusters_at_epsilon(&self, epsilon: f32) -> Vec<Vec<usize>> {
        epsilon_cut(
            self.num_points,
            &self.mst,
            epsilon,
            self.config.min_cluster_size,
        )
    }
}

/// Core distance of every point: the k-th smallest distance to the others.
fn core_distances(distances: &[Vec<f32>], k: usize) -> Vec<f32> {
    let n = distances.len();
    let mut core = vec![0.0; n];

    for i in 0..n {
        let mut neighbor_dists: Vec<f32> = (0..n).filter(|&j| j != i).map(|j| distances[i][j]).collect();
        if neighbor_dists.is_empty() {
            continue;
        }
        neighbor_dists.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        let idx = k.saturating_sub(1).min(neighbor_dists.len() - 1);
        core[i] = neighbor_dists[idx];
    }

    core
}

fn mutual_reachability(a: usize, b: usize, core: &[f32], distances: &[Vec<f32>]) -> f32 {
    core[a].max(core[b]).max(distances[a][b])
}

/// Prim's algorithm over the complete mutual-reachability graph, returning
/// edges sorted by ascending weight.
fn build_mst_prim(distances: &[Vec<f32>], core: &[f32]) -> Vec<MstEdge> {
    let n = distances.len();
    if n == 0 {
        return Vec::new();
    }

    let mut mst = Vec::with_capacity(n.saturating_sub(1));
    let mut in_tree = vec![false; n];
    let mut min_dist = vec![f32::INFINITY; n];
    let mut min_edge_from = vec![0usize; n];

    in_tree[0] = true;
    for j in 1..n {
        min_dist[j] = mutual_reachability(0, j, core, distances);
    }

    for _ in 0..n.saturating_sub(1) {
        let mut next = None;
        let mut best = f32::INFINITY;
        for j in 0..n {
            if !in_tree[j] && min_dist[j] < best {
                best = min_dist[j];
                next = Some(j);
            }
        }

        let Some(next) = next else { break };
        let from = min_edge_from[next];
        mst.push(MstEdge {
            a: from.min(next),
            b: from.max(next),
            distance: best,
        });
        in_tree[next] = true;

        for j in 0..n {
            if !in_tree[j] {
                let mrd = mutual_reachability(next, j, core, distances);
                if mrd < min_dist[j] {
                    min_dist[j] = mrd;
                    min_edge_from[j] = next;
                }
            }
        }
    }

    mst.sort_by(|x, y| {
        x.distance
            .partial_cmp(&y.distance)
            .unwrap_or(Ordering::Equal)
            .then(x.a.cmp(&y.a))
            .then(x.b.cmp(&y.b))
    });
    mst
}

/// Flat clustering from a sorted spanning tree: union edges with weight at
/// most `epsilon`, then dissolve components smaller than `min_cluster_size`
/// into per-point noise clusters appended after the real ones.
pub fn epsilon_cut(
    num_points: usize,
    mst: &[MstEdge],
    epsilon: f32,
    min_cluster_size: usize,
) -> Vec<Vec<usize>> {
    if num_points == 0 {
        return Vec::new();
    }

    let mut uf = UnionFind::new(num_points);
    for edge in mst {
        if edge.distance > epsilon {
            break;
        }
        uf.unite(edge.a, edge.b);
    }

    let mut clusters = Vec::new();
    let mut noise = Vec::new();
    for set in uf.sets() {
        if set.len() >= min_cluster_size {
            clusters.push(set);
        } else {
            noise.extend(set);
        }
    }

    for idx in noise {
        clusters.push(vec![idx]);
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // Four nearby unit vectors plus one isolated point orthogonal to all of
    // them (cosine distance ~1 from everything).
    fn with_outlier() -> Vec<Vec<f32>> {
        let close = |angle: f32| vec![angle.cos(), angle.sin(), 0.0];
        vec![
            close(0.00),
            close(0.05),
            close(0.10),
            close(0.15),
            vec![0.0, 0.0, 1.0],
        ]
    }

    #[test]
    fn isolated_point_becomes_noise_singleton() {
        let mut engine = Hdbscan::new(HdbscanConfig::default());
        engine.fit(&with_outlier());

        let clusters = engine.clusters();
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0], vec![0, 1, 2, 3]);
        assert_eq!(clusters[1], vec![4]);

        assert_eq!(engine.labels(), &[0, 0, 0, 0, -1]);
    }

    #[test]
    fn mst_is_sorted_and_canonical() {
        let mut engine = Hdbscan::new(HdbscanConfig::default());
        engine.fit(&with_outlier());

        let mst = engine.mst();
        assert_eq!(mst.len(), 4);
        for edge in mst {
            assert!(edge.a < edge.b);
        }
        for pair in mst.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
    }

    #[test]
    fn default_epsilon_is_the_edge_range_midpoint() {
        let mut engine = Hdbscan::new(HdbscanConfig::default());
        engine.fit(&with_outlier());

        let mst = engine.mst();
        let expected =
            mst[0].distance + (mst[mst.len() - 1].distance - mst[0].distance) * 0.5;
        assert!((engine.default_epsilon() - expected).abs() < 1e-6);
    }

    #[test]
    fn tight_epsilon_dissolves_everything_into_noise() {
        let mut engine = Hdbscan::new(HdbscanConfig::default());
        engine.fit(&with_outlier());

        let clusters = engine.clusters_at_epsilon(-1.0);
        assert_eq!(clusters.len(), 5);
        assert!(clusters.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn loose_epsilon_joins_everything() {
        let mut engine = Hdbscan::new(HdbscanConfig::default());
        engine.fit(&with_outlier());

        let clusters = engine.clusters_at_epsilon(2.0);
        assert_eq!(clusters, vec![vec![0, 1, 2, 3, 4]]);
    }

    #[test]
    fn empty_input_is_handled() {
        let mut engine = Hdbscan::new(HdbscanConfig::default());
        engine.fit(&[]);
        assert!(engine.clusters().is_empty());
        assert!(engine.mst().is_empty());
        assert!(engine.labels().is_empty());
    }

    #[test]
    fn epsilon_cut_preserves_point_coverage() {
        let mut engine = Hdbscan::new(HdbscanConfig::default());
        engine.fit(&with_outlier());

        for epsilon in [0.0, 0.2, 0.5, 1.0] {
            let clusters = engine.clusters_at_epsilon(epsilon);
            let mut seen: Vec<usize> = clusters.into_iter().flatten().collect();
            seen.sort_unstable();
            assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        }
    }
}
