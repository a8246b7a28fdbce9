mod config;
mod dataset;

#[cfg(test)]
mod dataset_test;

use clap::Parser;
use config::{ClusterConfig, ConfigErrors};
use itertools::Itertools;
use rayon::ThreadPoolBuilder;
use splitsort_sorter::{LocalCluster, SortError, Sorter};
use std::{path::PathBuf, process::ExitCode};
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::EnvFilter;

/// Find balanced splitter keys for a synthetic in-process cluster
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// YAML file describing the sort and the dataset
    #[arg(short, long)]
    config: PathBuf,

    /// override sort.partitions
    #[arg(short, long)]
    partitions: Option<usize>,

    /// override sort.tolerance
    #[arg(short, long)]
    tolerance: Option<f64>,

    /// override the size of the thread pool
    #[arg(long)]
    threads: Option<usize>,

    /// log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Error, Debug)]
enum RunError {
    #[error("Invalid configuration")]
    Config(#[from] ConfigErrors),
    #[error("Failed to start thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("Sort failed")]
    Sort(#[from] SortError),
    #[error("Failed to serialize partition table")]
    Output(#[from] serde_yaml::Error),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(error = ?error, "{error}");

            ExitCode::FAILURE
        }
    }
}

#[instrument(level = "debug")]
fn run(cli: Cli) -> Result<(), RunError> {
    let mut config = ClusterConfig::load(&cli.config)?;

    if let Some(partitions) = cli.partitions {
        config.sort.partitions = partitions;
    }
    if let Some(tolerance) = cli.tolerance {
        config.sort.tolerance = tolerance;
    }
    if cli.threads.is_some() {
        config.threads = cli.threads;
    }

    if config.preflight_checks() {
        return Err(ConfigErrors::PreflightFailed.into());
    }

    let mut pool = ThreadPoolBuilder::new();
    if let Some(threads) = config.threads {
        pool = pool.num_threads(threads);
    }
    pool.build_global()?;
    debug!("Started thread pool with {} threads", rayon::current_num_threads());

    let cluster = LocalCluster::new(dataset::generate(&config.dataset));
    info!(
        records = cluster.total(),
        holders = cluster.holders().len(),
        "Generated {:?} dataset",
        config.dataset.distribution
    );

    let mut sorter = Sorter::new(cluster);
    let table = sorter.sort(&config.sort, |table| {
        info!(
            "Sort done after {} rounds, largest deviation from average: {}",
            table.rounds,
            table.max_deviation()
        )
    })?;

    let average = table.total() / table.partitions() as u64;
    for (partition, count) in table.counts.iter().enumerate() {
        debug!(
            partition,
            count,
            deviation = count.abs_diff(average),
            "Partition size"
        );
    }

    if let Some(incoming) = sorter.provider().incoming() {
        debug!(
            "Records routed per partition: {}",
            incoming.iter().join(", ")
        );
    }

    print!("{}", serde_yaml::to_string(&table)?);

    Ok(())
}
