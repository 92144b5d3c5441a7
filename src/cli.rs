// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `taskdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskdag",
    version,
    about = "Resolve and run a DAG of tasks wired together by their products.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task configuration (TOML).
    ///
    /// Default: `taskdag.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "taskdag.toml")]
    pub input: String,

    /// Parse and resolve, print tasks and bindings, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Reject cyclic bindings before execution instead of waiting for the
    /// run to stall.
    #[arg(long)]
    pub check_cycles: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
