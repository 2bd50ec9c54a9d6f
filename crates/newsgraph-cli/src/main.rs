//! newsgraph CLI
//!
//! Loads the news article knowledge graph and serves the chatbot API.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use commands::Cli;

/// Initialize tracing. `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "newsgraph=debug,newsgraph_graph=debug,newsgraph_core=debug,newsgraph_web=debug,tower_http=debug"
    } else {
        "newsgraph=info,newsgraph_graph=info,newsgraph_core=info,newsgraph_web=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    cli.execute().await
}
