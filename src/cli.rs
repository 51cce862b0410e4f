// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `qualitydag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "qualitydag",
    version,
    about = "Load the FIFA-21 dataset into a warehouse and run data-quality checkpoints.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the settings file (TOML).
    ///
    /// Default: `Qualitydag.toml` in the current working directory. A
    /// missing file means built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of pipeline runs to request at startup. At most
    /// `max_queued_runs + 1` (queue mode) or 1 (skip mode).
    #[arg(long, value_name = "N", default_value_t = 1)]
    pub runs: usize,

    /// Directory backing the local object store (one subdirectory per
    /// bucket).
    ///
    /// Default: `.qualitydag/objects`.
    #[arg(long, value_name = "DIR")]
    pub sandbox: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `QUALITYDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Validate settings and print the pipeline, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run summaries as JSON on stdout.
    #[arg(long)]
    pub report: bool,
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

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
