// server/src/cli/cli.rs
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;

use graph_engine::store::GraphStore;

use crate::api::routes;
use crate::config::ServerConfig;

#[derive(Parser, Debug)]
#[command(name = "medkg-server", version, about = "Medical knowledge-graph comparison server")]
pub struct CliArgs {
    /// Optional YAML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the persisted knowledge-graph JSON file
    #[arg(long, value_name = "FILE")]
    pub graph: Option<PathBuf>,

    /// Bind host
    #[arg(long)]
    pub host: Option<String>,

    /// Bind port
    #[arg(long)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server (the default)
    Serve,
    /// Render a saved analysis result in the terminal viewer
    View {
        /// Path to an analysis JSON file (the /analyze response `data`)
        path: PathBuf,
    },
}

pub async fn start_cli() -> Result<()> {
    let args = CliArgs::parse();

    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(graph) = args.graph {
        config.graph_path = graph;
    }
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::View { path } => view(path).await,
    }
}

async fn serve(config: ServerConfig) -> Result<()> {
    let store = GraphStore::open(&config.graph_path)
        .await
        .map_err(|e| anyhow!("could not open knowledge graph: {}", e))?;
    let store = Arc::new(store);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.host, config.port))?;

    let api = routes(store, Duration::from_secs(config.request_timeout_secs));
    info!("serving knowledge graph API on http://{}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}

async fn view(path: PathBuf) -> Result<()> {
    let data = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read analysis file {}", path.display()))?;
    graph_visualizing::visualize_analysis_from_json(&data)
        .map_err(|e| anyhow!("visualization failed: {}", e))
}
