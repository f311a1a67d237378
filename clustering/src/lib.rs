//! Clustering engines for embedded diff chunks.
//!
//! Two peers over the same cosine-distance space: single-linkage
//! agglomerative clustering that records the full merge history as a
//! dendrogram ([`hac`]), and an HDBSCAN-style engine built on core distances
//! and a mutual-reachability spanning tree ([`hdbscan`]). Both cut to flat
//! clusters with the shared [`UnionFind`]. A small power-iteration PCA
//! ([`project_2d`]) supplies 2-D coordinates for visualization.

mod hac;
mod hdbscan;
mod projection;
mod union_find;

pub use hac::{
    cosine_distance, cut_at_threshold, single_linkage, single_linkage_from_distances, Dendrogram,
    MergeEvent,
};
pub use hdbscan::{epsilon_cut, Hdbscan, HdbscanConfig, MstEdge};
pub use projection::project_2d;
pub use union_find::UnionFind;
