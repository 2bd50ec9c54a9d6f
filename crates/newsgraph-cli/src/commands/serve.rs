//! Web server command.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use newsgraph_web::{AppState, RemoteAgent};

#[derive(Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, default_value = "8000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Base URL of the question-answering agent service
    #[arg(long, env = "AGENT_URL")]
    pub agent_url: String,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", args.host, args.port))?;

    let agent = Arc::new(RemoteAgent::new(&args.agent_url));
    let state = AppState::new(agent);

    println!();
    println!("  {} {}", "newsgraph".cyan().bold(), "Chatbot API".bold());
    println!();
    println!("  {}     http://{}", "Status".green(), addr);
    println!("  {}      http://{}/doc-rag-agent", "Query".green(), addr);
    println!("  {}      {}", "Agent".green(), args.agent_url);
    println!();
    println!("  {}", "Ctrl+C to stop".dimmed());
    println!();

    newsgraph_web::run_server(state, addr).await?;

    Ok(())
}
