// src/watch/debouncer.rs

//! Pure watch-loop state machine.
//!
//! This module contains a synchronous, deterministic core that consumes
//! [`WatchEvent`]s and produces:
//! - an updated [`WatchState`]
//! - a list of [`WatchCommand`]s describing what the IO shell should do next
//!
//! The async shell (`watch::runtime::WatchRuntime`) owns the timers, the
//! watchers and the in-flight build future. The core has no Tokio types and
//! performs no IO, so it can be tested exhaustively.
//!
//! Guarantees:
//! - at most one build is in flight;
//! - requests that arrive before a scheduled build starts are absorbed into
//!   it, so a burst of notifications produces one build;
//! - requests that arrive while a build runs produce exactly one more build
//!   after it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::engine::BuildOutcome;
use crate::watch::path_utils::dedup_preserving_order;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    /// A build is scheduled (debounce running) or executing.
    Building,
    /// A build is executing and another one has been requested.
    PendingRebuild,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// A watched file changed, or a rebuild was requested explicitly.
    RebuildRequested,
    /// The debounce delay after leaving `Idle` has passed.
    DebounceElapsed,
    /// The pending-rebuild timer fired; handled as a re-emitted request.
    PendingElapsed,
    /// The in-flight build reached its terminal event.
    BuildFinished(BuildOutcome),
}

/// Command produced by the core, executed by the IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    /// Drop the live watcher set, if any.
    TearDownWatchers,
    /// Fire `DebounceElapsed` after the delay.
    ArmDebounce(Duration),
    StartBuild,
    /// Fire `PendingElapsed` after the delay, replacing an armed timer.
    ArmPending(Duration),
    /// Establish one-shot watchers over exactly these paths.
    Rewatch(Vec<PathBuf>),
}

#[derive(Debug)]
pub struct Debouncer {
    source: PathBuf,
    delay: Duration,
    state: WatchState,
    /// `false` while the debounce timer for the scheduled build is running.
    build_started: bool,
    builds_started: u64,
}

impl Debouncer {
    pub fn new(source: impl Into<PathBuf>, delay: Duration) -> Self {
        Self {
            source: source.into(),
            delay,
            state: WatchState::Idle,
            build_started: false,
            builds_started: 0,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Number of `StartBuild` commands issued so far.
    pub fn builds_started(&self) -> u64 {
        self.builds_started
    }

    /// Whether a build is executing (not merely scheduled).
    pub fn is_build_running(&self) -> bool {
        self.state != WatchState::Idle && self.build_started
    }

    /// Handle a single event, returning the commands for the IO shell.
    pub fn step(&mut self, event: WatchEvent) -> Vec<WatchCommand> {
        match event {
            WatchEvent::RebuildRequested | WatchEvent::PendingElapsed => {
                self.handle_rebuild_request()
            }
            WatchEvent::DebounceElapsed => self.handle_debounce_elapsed(),
            WatchEvent::BuildFinished(outcome) => self.handle_build_finished(outcome),
        }
    }

    fn handle_rebuild_request(&mut self) -> Vec<WatchCommand> {
        match self.state {
            WatchState::Idle => {
                debug!(delay = ?self.delay, "rebuild requested; scheduling build");
                self.state = WatchState::Building;
                self.build_started = false;
                vec![WatchCommand::TearDownWatchers, WatchCommand::ArmDebounce(self.delay)]
            }
            WatchState::Building if !self.build_started => {
                debug!("rebuild requested before scheduled build started; absorbed");
                Vec::new()
            }
            WatchState::Building | WatchState::PendingRebuild => {
                debug!("rebuild requested while building; deferring");
                self.state = WatchState::PendingRebuild;
                vec![WatchCommand::ArmPending(self.delay)]
            }
        }
    }

    fn handle_debounce_elapsed(&mut self) -> Vec<WatchCommand> {
        if self.state == WatchState::Idle || self.build_started {
            debug!(state = ?self.state, "stale debounce timer; ignoring");
            return Vec::new();
        }
        self.build_started = true;
        self.builds_started += 1;
        vec![WatchCommand::StartBuild]
    }

    fn handle_build_finished(&mut self, outcome: BuildOutcome) -> Vec<WatchCommand> {
        let previous = self.state;
        self.state = WatchState::Idle;
        self.build_started = false;

        match previous {
            WatchState::Idle => {
                warn!("build finished while idle; ignoring");
                Vec::new()
            }
            WatchState::Building => {
                vec![WatchCommand::Rewatch(rewatch_paths(&self.source, &outcome))]
            }
            WatchState::PendingRebuild => {
                // The armed pending timer starts the follow-up build, which
                // rewatches when it ends.
                debug!("build finished with a rebuild pending; skipping rewatch");
                Vec::new()
            }
        }
    }
}

/// Source path, plus the dependency list on success. Duplicates removed.
pub fn rewatch_paths(source: &Path, outcome: &BuildOutcome) -> Vec<PathBuf> {
    let mut paths = vec![source.to_path_buf()];
    if let BuildOutcome::Done(dependencies) = outcome {
        paths.extend(dependencies.iter().cloned());
    }
    dedup_preserving_order(paths)
}
