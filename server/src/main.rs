// server/src/main.rs

// This is the main entry point for the knowledge-graph server application.
// It handles command-line argument parsing and dispatches to the CLI logic.

use anyhow::Result;
use log::info;
use medkg_server::cli::cli::start_cli;
use tokio::signal::unix::{signal, SignalKind};

async fn handle_signals() {
    let mut sigterm = signal(SignalKind::terminate()).expect("Failed to set up SIGTERM handler");
    let mut sigint = signal(SignalKind::interrupt()).expect("Failed to set up SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    tokio::select! {
        result = start_cli() => result,
        _ = handle_signals() => Ok(()),
    }
}
