//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use newsgraph_graph::{GraphClient, GraphConfig};

pub mod graph;
pub mod load;
pub mod serve;

/// newsgraph - News article knowledge graph loader and chatbot API
#[derive(Parser)]
#[command(name = "newsgraph")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the articles and traffic CSV sources into Neo4j
    Load(load::LoadArgs),

    /// Show node and relationship counts
    Status(graph::StatusArgs),

    /// Find the reporter whose articles gained the most sessions
    TopReporter(graph::TopReporterArgs),

    /// Start the chatbot HTTP API
    Serve(serve::ServeArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Load(args) => load::execute(args).await,
            Commands::Status(args) => graph::status(args).await,
            Commands::TopReporter(args) => graph::top_reporter(args).await,
            Commands::Serve(args) => serve::execute(args).await,
        }
    }
}

/// Neo4j connection settings.
#[derive(Args, Debug, Clone)]
pub struct Neo4jArgs {
    /// Bolt URI of the Neo4j server
    #[arg(long = "neo4j-uri", env = "NEO4J_URI", default_value = "bolt://localhost:7687")]
    pub uri: String,

    /// Neo4j user
    #[arg(long = "neo4j-user", env = "NEO4J_USERNAME", default_value = "neo4j")]
    pub user: String,

    /// Neo4j password
    #[arg(long = "neo4j-password", env = "NEO4J_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Database name
    #[arg(long = "neo4j-database", env = "NEO4J_DATABASE", default_value = "neo4j")]
    pub database: String,
}

impl Neo4jArgs {
    pub fn config(&self) -> Result<GraphConfig> {
        let password = self
            .password
            .clone()
            .context("Neo4j password missing: set NEO4J_PASSWORD or pass --neo4j-password")?;

        Ok(GraphConfig {
            uri: self.uri.clone(),
            user: self.user.clone(),
            password,
            database: self.database.clone(),
        })
    }

    pub async fn connect(&self) -> Result<GraphClient> {
        let config = self.config()?;
        GraphClient::connect(&config)
            .await
            .with_context(|| format!("Failed to connect to Neo4j at {}", config.uri))
    }
}
