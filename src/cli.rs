// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Default dev server port used when `--dev` is given without a value.
pub const DEFAULT_DEV_PORT: u32 = 8080;

/// Command-line arguments for `bunny`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bunny",
    version,
    about = "Build an output file by running the Lua script embedded in an HTML document.",
    long_about = None
)]
pub struct CliArgs {
    /// HTML document holding the build script (`<script role="main">`).
    #[arg(value_name = "INPUT")]
    pub source: PathBuf,

    /// Output file written by `save(...)`.
    #[arg(value_name = "OUTPUT")]
    pub target: Option<PathBuf>,

    /// Watch the files the build read and rebuild every time one of them changes.
    #[arg(short, long)]
    pub watch: bool,

    /// Run a dev server on the given port (default 8080); implies `--watch`.
    #[arg(
        short,
        long,
        value_name = "PORT",
        num_args = 0..=1,
        default_missing_value = "8080"
    )]
    pub dev: Option<u32>,

    /// Do not open a browser window after the first successful dev build.
    #[arg(long)]
    pub no_open: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUNNY_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// Arguments for a plain one-shot build.
    pub fn once(source: impl Into<PathBuf>, target: Option<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target,
            watch: false,
            dev: None,
            no_open: true,
            log_level: None,
        }
    }
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
