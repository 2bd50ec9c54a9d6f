//! Graph load command.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tracing::info;

use newsgraph_core::RetryPolicy;
use newsgraph_graph::{
    GraphClient, GraphLoader, GraphStore, Ingest, LoaderSources, MemoryGraph, DEFAULT_BATCH_SIZE,
};

use super::Neo4jArgs;
use crate::output;

#[derive(Args)]
pub struct LoadArgs {
    /// Articles CSV URL. Neo4j reads it with LOAD CSV, so file:/// URLs
    /// resolve in the server's import directory
    #[arg(long, env = "ARTICLES_CSV_PATH")]
    pub articles: String,

    /// Traffic CSV URL, resolved like --articles
    #[arg(long, env = "TRAFFIC_CSV_PATH")]
    pub traffic: String,

    /// Attempts before giving up
    #[arg(long, env = "LOADER_MAX_ATTEMPTS", default_value_t = 100)]
    pub max_attempts: u32,

    /// Seconds to wait between attempts
    #[arg(long, env = "LOADER_RETRY_DELAY_SECS", default_value_t = 10)]
    pub retry_delay_secs: u64,

    /// Rows per transaction
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Read the CSVs on this host and stream rows to Neo4j instead of
    /// LOAD CSV; file:// URLs and bare paths are then local files
    #[arg(long)]
    pub stream_rows: bool,

    /// Read the CSVs on this host and load them into memory only
    #[arg(long, conflicts_with = "stream_rows")]
    pub dry_run: bool,

    #[command(flatten)]
    pub neo4j: Neo4jArgs,
}

pub async fn execute(args: LoadArgs) -> Result<()> {
    let sources = LoaderSources::new(&args.articles, &args.traffic);

    if args.dry_run {
        return dry_run(sources, args.batch_size).await;
    }

    let policy = RetryPolicy::fixed(args.max_attempts, Duration::from_secs(args.retry_delay_secs));
    let config = args.neo4j.config()?;

    println!("{}", "Loading news graph...".bold());

    let client = policy
        .run(|attempt| {
            let config = config.clone();
            async move {
                info!(attempt, uri = %config.uri, "Connecting to Neo4j");
                GraphClient::connect(&config).await
            }
        })
        .await
        .with_context(|| format!("Failed to connect to Neo4j at {}", config.uri))?;

    let ingest = if args.stream_rows {
        Ingest::Streamed
    } else {
        Ingest::ServerSide
    };
    let loader = GraphLoader::new(client, sources)
        .with_batch_size(args.batch_size)
        .with_ingest(ingest);
    let outcome = loader.run_with_retry(&policy).await;

    let client = loader.into_store();
    let counts = match &outcome {
        Ok(_) => Some(client.counts().await.context("Failed to read graph counts")?),
        Err(_) => None,
    };
    client.close();

    let report = outcome.context("Graph load failed")?;
    output::print_load_report(&report);
    if let Some(counts) = counts {
        output::print_counts(&counts);
    }

    Ok(())
}

async fn dry_run(sources: LoaderSources, batch_size: usize) -> Result<()> {
    println!("{}", "Dry run: loading into memory".bold());

    let loader = GraphLoader::new(MemoryGraph::new(), sources)
        .with_batch_size(batch_size)
        .with_ingest(Ingest::Streamed);
    let report = loader.run().await.context("Dry run failed")?;
    let counts = loader.store().counts().await?;

    output::print_load_report(&report);
    output::print_counts(&counts);
    Ok(())
}
