//! Knowledge graph read commands.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use newsgraph_graph::{most_productive_reporter, reporter_performance, GraphStore};

use super::Neo4jArgs;
use crate::output;

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub neo4j: Neo4jArgs,
}

#[derive(Args)]
pub struct TopReporterArgs {
    /// Report a single reporter instead of the top one
    #[arg(long)]
    pub name: Option<String>,

    #[command(flatten)]
    pub neo4j: Neo4jArgs,
}

/// Show node/relationship counts per kind.
pub async fn status(args: StatusArgs) -> Result<()> {
    let client = args.neo4j.connect().await?;
    let counts = client.counts().await;
    client.close();

    output::print_counts(&counts?);
    Ok(())
}

/// Show the most productive reporter, or one reporter's sessions.
pub async fn top_reporter(args: TopReporterArgs) -> Result<()> {
    let client = args.neo4j.connect().await?;
    let found = match &args.name {
        Some(name) => reporter_performance(&client, name).await,
        None => most_productive_reporter(&client).await,
    };
    client.close();

    match found? {
        Some(performance) => output::print_performance(&performance),
        None => match args.name {
            Some(name) => println!("{} {}", "Unknown reporter:".red(), name),
            None => println!("{}", "No reporters in the graph.".dimmed()),
        },
    }
    Ok(())
}
