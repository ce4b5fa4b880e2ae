// src/lib.rs

pub mod cli;
pub mod config;
pub mod document;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod observer;
pub mod server;
pub mod watch;

use std::future::Future;
use std::rc::Rc;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{resolve_run_mode, BuildConfig, RawBuildConfig, RunMode};
use crate::engine::{BuildOutcome, Builder};
use crate::errors::Result;
use crate::fs::RealFileSystem;
use crate::observer::LogObserver;
use crate::watch::{Debouncer, NotifyBackend, WatchRuntime};

/// How a run ended, when it did not hit a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    /// One-shot build ended in `Fail`. Watch and dev modes never return this.
    BuildFailed,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config validation (fatal errors surface here, before any build)
/// - run mode selection
/// - the one-shot build, the watch loop or the dev server
/// - Ctrl-C handling for the long-running modes
pub async fn run(args: CliArgs) -> Result<RunStatus> {
    let cwd = std::env::current_dir()?;
    let config = BuildConfig::try_from(RawBuildConfig {
        source: args.source.clone(),
        target: args.target.clone(),
        cwd,
    })?;
    let mode = resolve_run_mode(&args, &config)?;
    info!(source = ?config.source(), target = ?config.target(), ?mode, "starting");

    match mode {
        RunMode::Once => match build_once(&config).await {
            BuildOutcome::Done(_) => Ok(RunStatus::Success),
            BuildOutcome::Fail(_) => Ok(RunStatus::BuildFailed),
        },
        RunMode::Watch => {
            watch(&config, shutdown_signal()).await?;
            Ok(RunStatus::Success)
        }
        RunMode::Dev(dev) => {
            server::run_server(
                &config,
                dev,
                Arc::new(RealFileSystem),
                NotifyBackend,
                shutdown_signal(),
            )
            .await?;
            Ok(RunStatus::Success)
        }
    }
}

/// Run a single build attempt against the real filesystem.
pub async fn build_once(config: &BuildConfig) -> BuildOutcome {
    Builder::new(config, Arc::new(RealFileSystem))
        .build(&LogObserver::new())
        .await
}

/// Build, then rebuild on every change, until `shutdown` resolves.
pub async fn watch(config: &BuildConfig, shutdown: impl Future<Output = ()>) -> Result<()> {
    let runtime = WatchRuntime::new(
        Debouncer::new(config.source(), config.debounce()),
        Builder::new(config, Arc::new(RealFileSystem)),
        Rc::new(LogObserver::new()),
        NotifyBackend,
    );
    runtime.run(shutdown).await
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C: {err}");
        std::future::pending::<()>().await;
    }
}
