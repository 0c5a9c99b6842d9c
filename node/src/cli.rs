//! # CLI Interface
//!
//! Defines the command-line argument structure for `metavault-node` using
//! `clap` derive. Supports three subcommands: `serve`, `replay`, and
//! `version`.

use clap::{Parser, Subcommand};
use metavault_protocol::config::{DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// MetaVault governance node.
///
/// Hosts a single meta vault in memory, serves its JSON-RPC API and
/// Prometheus metrics, or replays a scenario file against a fresh vault.
#[derive(Parser, Debug)]
#[command(
    name = "metavault-node",
    about = "MetaVault governance node",
    version,
    propagate_version = true
)]
pub struct MetaVaultNodeCli {
    /// Log output format.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "METAVAULT_LOG_FORMAT",
        default_value = "pretty"
    )]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a vault from a genesis file and serve it over HTTP.
    Serve(ServeArgs),
    /// Run every call of a scenario file and print a JSON report.
    Replay(ReplayArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Genesis file (JSON): vault parameters and deployed modules.
    #[arg(long, short = 'g', env = "METAVAULT_GENESIS")]
    pub genesis: PathBuf,

    /// Interface to bind both listeners on.
    #[arg(long, env = "METAVAULT_BIND", default_value = "0.0.0.0")]
    pub bind: String,

    /// Port for the JSON-RPC and REST API.
    #[arg(long, env = "METAVAULT_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "METAVAULT_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,
}

/// Arguments for the `replay` subcommand.
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Scenario file (JSON): genesis plus a list of calls.
    #[arg(long, short = 's', env = "METAVAULT_SCENARIO")]
    pub scenario: PathBuf,

    /// Exit with an error if any call is rejected.
    #[arg(long)]
    pub strict: bool,
}
