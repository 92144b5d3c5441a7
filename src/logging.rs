// src/logging.rs

//! Logging setup for `taskdag` using `tracing` + `tracing-subscriber`.
//!
//! Filter selection:
//! 1. `--log-level` CLI flag applies one level to everything
//! 2. `TASKDAG_LOG` accepts full `EnvFilter` directives
//!    (e.g. `info,taskdag::dag::resolver=debug`)
//! 3. default to `info`
//!
//! Logs are sent to STDERR so that stdout only carries `--dry-run` output.

use anyhow::{Result, anyhow};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

/// Environment variable holding the default filter directives.
pub const LOG_ENV: &str = "TASKDAG_LOG";

/// Initialise global logging subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_env_filter(build_filter(cli_level)?)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>) -> Result<EnvFilter> {
    if let Some(lvl) = cli_level {
        return Ok(EnvFilter::default().add_directive(level_filter(lvl).into()));
    }

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .with_env_var(LOG_ENV)
        .from_env()?;
    Ok(filter)
}

fn level_filter(lvl: LogLevel) -> LevelFilter {
    match lvl {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}
