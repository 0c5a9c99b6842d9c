// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # MetaVault Node
//!
//! Entry point for the `metavault-node` binary. Parses CLI arguments,
//! initializes logging and metrics, and either serves a vault over HTTP or
//! replays a scenario against one.
//!
//! The binary supports three subcommands:
//!
//! - `serve`   : build a vault from a genesis file, serve the HTTP/WS API
//! - `replay`  : run a scenario file and print a JSON report to stdout
//! - `version` : print build version information

mod api;
mod cli;
mod logging;
mod metrics;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{broadcast, RwLock};

use metavault_protocol::config::{EVENT_CHANNEL_CAPACITY, PROTOCOL_VERSION};

use cli::{Commands, MetaVaultNodeCli};
use metrics::NodeMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MetaVaultNodeCli::parse();

    match cli.command {
        Commands::Serve(args) => {
            logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);
            serve(args).await
        }
        Commands::Replay(args) => {
            logging::init_logging(logging::DEFAULT_FILTER, cli.log_format);
            replay(args)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Builds the genesis vault and serves the API and metrics endpoints until
/// a shutdown signal arrives.
async fn serve(args: cli::ServeArgs) -> Result<()> {
    tracing::info!(
        genesis = %args.genesis.display(),
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        "starting metavault-node"
    );

    // --- Vault ---
    let genesis = scenario::load_genesis(&args.genesis)?;
    let vault = genesis.build()?;

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new());
    node_metrics.observe_vault(&vault);

    // --- Event broadcast ---
    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

    // --- Application state ---
    let app_state = api::AppState {
        version: format!("{} (protocol {})", env!("CARGO_PKG_VERSION"), PROTOCOL_VERSION),
        vault: Arc::new(RwLock::new(vault)),
        event_tx,
        metrics: Arc::clone(&node_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("{}:{}", args.bind, args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind RPC listener on {}", api_addr))?;
    tracing::info!("RPC/API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("{}:{}", args.bind, args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("metavault-node stopped");
    Ok(())
}

/// Replays a scenario file and prints the report as JSON on stdout.
fn replay(args: cli::ReplayArgs) -> Result<()> {
    let scenario = scenario::load_scenario(&args.scenario)?;
    let metrics = NodeMetrics::new();
    let report = scenario::replay(scenario, Some(&metrics))?;

    let json = serde_json::to_string_pretty(&report).context("failed to encode replay report")?;
    println!("{}", json);

    if args.strict && report.rejected > 0 {
        anyhow::bail!("{} of {} calls were rejected", report.rejected, report.outcomes.len());
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("metavault-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol       {}", PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed, that branch never resolves and the other one still applies.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
