//! CLI for issuing scheduler RPCs.

mod commands;

use anyhow::Result;
use aurora_client_core::config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_call, run_clusters, run_completions, run_methods, run_url};

/// Top-level CLI for the scheduler client.
#[derive(Debug, Parser)]
#[command(name = "aurora-client")]
#[command(about = "Issue RPCs to a leader-elected cluster scheduler", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/aurora-client/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Call one scheduler RPC and print the response.
    Call {
        /// Cluster name from the config file.
        cluster: String,
        /// RPC name, e.g. getJobs.
        method: String,
        /// Positional arguments, each an encoded Thrift JSON value.
        args: Vec<String>,
        /// The call is idempotent: retry it if the connection drops.
        #[arg(long)]
        retry: bool,
    },

    /// Print the scheduler URL of a cluster.
    Url {
        cluster: String,
        /// Print the scheduler's own address even when a proxy URL is configured.
        #[arg(long)]
        raw: bool,
    },

    /// List configured clusters.
    Clusters,

    /// List the RPCs `call` accepts.
    Methods,

    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Methods => return run_methods(),
            CliCommand::Completions { shell } => return run_completions(shell),
            _ => {}
        }

        let cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load_or_init()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Call {
                cluster,
                method,
                args,
                retry,
            } => run_call(&cfg, &cluster, &method, &args, retry)?,
            CliCommand::Url { cluster, raw } => run_url(&cfg, &cluster, raw)?,
            CliCommand::Clusters => run_clusters(&cfg)?,
            CliCommand::Methods | CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
