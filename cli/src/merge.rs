//! Merge mode: diff on stdin in, dendrogram JSON on stdout out.
//!
//! This is the expensive half of the pipeline (one embedding request per
//! chunk), so everything the cheap half needs is captured in the emitted
//! document; rerunning with a different threshold costs nothing.

use crate::document::{embedding_text, preview, ChunkRecord, ClusterAlgorithm, MergeDocument};
use anyhow::{bail, Context, Result};
use futures::future::join_all;
use gcommit_clustering::{project_2d, single_linkage, Dendrogram, Hdbscan, HdbscanConfig, MergeEvent};
use gcommit_diff_chunker::DiffChunker;
use gcommit_openai::OpenAiClient;
use gcommit_patch::{DiffChunk, DiffParser};
use log::{debug, info, warn};
use std::io::Read;

pub async fn run(algorithm: ClusterAlgorithm) -> Result<()> {
    let client = OpenAiClient::from_env()?;

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read diff from stdin")?;

    let parsed = DiffParser::parse(&input);
    info!("parsed {} chunks from diff", parsed.len());

    let chunker = DiffChunker::default();
    let chunks: Vec<DiffChunk> = parsed.iter().flat_map(|chunk| chunker.split(chunk)).collect();
    if chunks.is_empty() {
        bail!("no chunks to process");
    }
    debug!("{} chunks after splitting", chunks.len());

    let embeddings = embed_all(&client, &chunks).await;

    let labels = chunks.iter().map(|chunk| chunk.filepath.clone()).collect();
    let merges = match algorithm {
        ClusterAlgorithm::Hac => single_linkage(&embeddings),
        ClusterAlgorithm::Hdbscan => {
            let mut engine = Hdbscan::new(HdbscanConfig::default());
            engine.fit(&embeddings);
            info!(
                "mutual-reachability tree built, default epsilon {:.4}",
                engine.default_epsilon()
            );
            engine
                .mst()
                .iter()
                .map(|edge| MergeEvent {
                    left: edge.a,
                    right: edge.b,
                    distance: edge.distance,
                })
                .collect()
        }
    };
    let dendrogram = Dendrogram::new(labels, merges);

    let coordinates = project_2d(&embeddings);

    let records = chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let (umap_x, umap_y) = coordinates.get(index).copied().unwrap_or((0.0, 0.0));
            ChunkRecord {
                preview: preview(&chunk),
                chunk,
                index,
                umap_x,
                umap_y,
            }
        })
        .collect();

    let document = MergeDocument {
        dendrogram,
        algorithm,
        chunks: records,
    };
    println!("{}", serde_json::to_string(&document)?);
    Ok(())
}

/// Submit every embedding request, then wait for the whole batch.
///
/// The result is index-aligned with `chunks`; a failed request leaves an
/// empty vector at its slot, which downstream clustering treats as
/// maximally distant.
async fn embed_all(client: &OpenAiClient, chunks: &[DiffChunk]) -> Vec<Vec<f32>> {
    info!("requesting embeddings for {} chunks", chunks.len());
    let texts: Vec<String> = chunks.iter().map(embedding_text).collect();
    let requests = texts.iter().map(|text| client.embed(text));

    join_all(requests)
        .await
        .into_iter()
        .enumerate()
        .map(|(index, result)| match result {
            Ok(vector) => vector,
            Err(err) => {
                warn!("embedding failed for chunk {index}: {err}");
                Vec::new()
            }
        })
        .collect()
}
