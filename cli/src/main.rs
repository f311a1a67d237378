//! `gcommit`: split a large working diff into coherent commits.
//!
//! Two invocations form one workflow. `gcommit -m` reads a unified diff on
//! stdin, embeds and clusters its chunks, and prints a JSON document with
//! the full merge history. `gcommit -t <dist> <merge.json>` cuts that
//! history at a distance threshold, writes one patch directory per cluster,
//! and prints the resulting commit plan. The split keeps the embedding pass
//! (the only expensive step) out of the threshold-tuning loop.

mod document;
mod merge;
mod threshold;

use clap::{ArgAction, Parser};
use document::ClusterAlgorithm;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "gcommit",
    about = "Group a working diff into logical commits by embedding similarity.",
    disable_help_subcommand = true
)]
struct Cli {
    /// Merge mode: read a unified diff on stdin, print the dendrogram JSON.
    #[arg(short = 'm', long = "merge", conflicts_with = "threshold")]
    merge: bool,

    /// Threshold mode: cut the stored dendrogram at this cosine distance.
    #[arg(short = 't', long = "threshold", value_name = "DIST")]
    threshold: Option<f32>,

    /// Merge-mode JSON from a previous `-m` run (threshold mode only).
    #[arg(value_name = "MERGE_JSON")]
    merge_json: Option<PathBuf>,

    /// Clustering engine used in merge mode.
    #[arg(long = "algorithm", value_enum, default_value = "hac")]
    algorithm: ClusterAlgorithm,

    /// Increase verbosity (-v for progress, -vv for debug detail).
    #[arg(short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Info);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Debug);
        }
    }
    // Keep stdout clean: it carries nothing but the JSON document.
    builder.target(env_logger::Target::Stderr).init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(1);
        }
    };
    init_logging(cli.verbose);

    let result = match (cli.merge, cli.threshold) {
        (true, _) => merge::run(cli.algorithm).await,
        (false, Some(threshold)) => match cli.merge_json {
            Some(path) => threshold::run(threshold, &path).await,
            None => Err(anyhow::anyhow!(
                "threshold mode requires the merge-mode JSON path"
            )),
        },
        (false, None) => Err(anyhow::anyhow!(
            "specify a mode: -m (merge) or -t <threshold> <merge_json>"
        )),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}
