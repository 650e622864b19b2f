//! Command-line interface built on clap.
//!
//! Defines [`Cli`] with the [`Command`] subcommands (serve, poll, demo) and
//! the global `--config` and `--verbose` flags.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Simulated video translation server and status polling client.
#[derive(Debug, Parser)]
#[command(name = "translation-status", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML config file (defaults to ./translation.toml).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Runs the simulated translation server until Ctrl-C.
    Serve(ServeArgs),

    /// Polls a running server until the job completes or fails.
    Poll {
        /// Server base URL, overriding the config file.
        #[arg(long)]
        url: Option<String>,

        /// Overall polling budget in seconds.
        #[arg(long)]
        timeout: Option<f64>,
    },

    /// Starts an in-process server and polls it.
    Demo(ServeArgs),
}

/// Server overrides shared by `serve` and `demo`.
#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Seconds until the job leaves `pending`.
    #[arg(long)]
    pub completion_time: Option<f64>,

    /// Probability in [0, 1] that the job ends in `error`.
    #[arg(long)]
    pub error_rate: Option<f64>,

    /// Port to listen on (0 picks a free port).
    #[arg(long)]
    pub port: Option<u16>,

    /// Start the job clock on the first request instead of at startup.
    #[arg(long, default_value_t = false)]
    pub lazy_start: bool,
}
