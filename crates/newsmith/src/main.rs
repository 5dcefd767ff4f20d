// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Newsmith daemon entry point.

mod unconfigured;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use newsmith_agents::LlmAgents;
use newsmith_config::{load_config, load_config_from_path, validate, NewsmithConfig};
use newsmith_gateway::{GatewayState, ProgressHub, ServerConfig};
use newsmith_memory::ConversationGateway;
use newsmith_orchestrator::{Orchestrator, Ports};
use newsmith_vector::VectorGateway;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::unconfigured::{LocalMemoryStore, Unconfigured};

#[derive(Parser)]
#[command(name = "newsmith", about = "Conversational news pipeline daemon")]
struct Cli {
    /// Path to an explicit config file (overrides the XDG hierarchy).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the gateway and orchestrator.
    Serve,
    /// Load and validate the configuration, then exit.
    CheckConfig,
}

fn resolve_config(path: Option<&PathBuf>) -> NewsmithConfig {
    let loaded = match path {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };
    match loaded {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = resolve_config(cli.config.as_ref());

    let diagnostics = validate(&config);
    if !diagnostics.is_empty() {
        for diagnostic in &diagnostics {
            eprintln!("config: {}: {}", diagnostic.key, diagnostic.message);
        }
        std::process::exit(1);
    }

    match cli.command {
        Command::CheckConfig => {
            println!("configuration ok");
        }
        Command::Serve => serve(config).await,
    }
}

async fn serve(config: NewsmithConfig) {
    init_tracing(&config.agent.log_level);

    let progress = Arc::new(ProgressHub::new());
    let state_store = Arc::new(LocalMemoryStore::new());
    let unconfigured = Arc::new(Unconfigured);

    // Provider adapters plug in here; until then the surface boots in a
    // degraded mode where workflows fail with `unavailable`.
    warn!("no provider integrations configured; workflows will fail until adapters are wired");

    let ports = Ports {
        llm: Arc::new(LlmAgents::new(unconfigured.clone(), config.llm.clone())),
        embeddings: unconfigured.clone(),
        news: unconfigured.clone(),
        videos: unconfigured.clone(),
        vectors: Arc::new(VectorGateway::new(unconfigured.clone())),
        scraper: unconfigured.clone(),
        conversations: Arc::new(ConversationGateway::new(state_store.clone())),
        state_store,
        progress: progress.clone(),
    };

    let orchestrator = Arc::new(Orchestrator::new(ports, config.clone()));
    let state = Arc::new(GatewayState {
        orchestrator: orchestrator.clone(),
        progress,
    });

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
    };
    let shutdown = CancellationToken::new();

    let server = tokio::spawn({
        let shutdown = shutdown.clone();
        async move { newsmith_gateway::start_server(&server_config, state, shutdown).await }
    });

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(err) => error!(error = %err, "failed to listen for shutdown signal"),
    }

    shutdown.cancel();
    orchestrator.close().await;

    match server.await {
        Ok(Ok(())) => info!("gateway stopped"),
        Ok(Err(err)) => error!(error = %err, "gateway exited with error"),
        Err(err) => error!(error = %err, "gateway task panicked"),
    }
}
