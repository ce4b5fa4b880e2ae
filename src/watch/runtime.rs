// src/watch/runtime.rs

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use tokio::sync::mpsc;
use tokio::time::{sleep, Sleep};
use tracing::{debug, error, info};

use crate::engine::{BuildOutcome, Builder};
use crate::errors::Result;
use crate::observer::BuildObserver;

use super::debouncer::{Debouncer, WatchCommand, WatchEvent};
use super::watcher::{ChangeNotice, ChangeNotifier, WatchBackend, WatchGuard};

type BuildFuture = Pin<Box<dyn Future<Output = BuildOutcome>>>;

/// Requests a rebuild from outside the watch loop.
#[derive(Debug, Clone)]
pub struct RebuildHandle {
    tx: mpsc::UnboundedSender<ChangeNotice>,
}

impl RebuildHandle {
    /// Returns `false` once the watch loop has exited.
    pub fn request(&self) -> bool {
        self.tx.send(ChangeNotice::Requested).is_ok()
    }
}

/// Timers and the in-flight build, owned by `run` for the loop's lifetime.
#[derive(Default)]
struct Slots {
    debounce: Option<Pin<Box<Sleep>>>,
    pending: Option<Pin<Box<Sleep>>>,
    build: Option<BuildFuture>,
}

enum Wake {
    Shutdown,
    Notice(Option<ChangeNotice>),
    Debounce,
    Pending,
    Finished(BuildOutcome),
}

/// Drives the [`Debouncer`] with real timers, watchers and builds.
///
/// This is a pure IO shell around the debouncer, which contains all the
/// scheduling semantics. Everything runs on the caller's task: the build
/// future is polled by the same `select!` that waits for changes.
pub struct WatchRuntime<W: WatchBackend> {
    core: Debouncer,
    builder: Builder,
    observer: Rc<dyn BuildObserver>,
    backend: W,
    notice_tx: mpsc::UnboundedSender<ChangeNotice>,
    notice_rx: mpsc::UnboundedReceiver<ChangeNotice>,
    watchers: Option<WatchGuard>,
    /// Generation of the live watcher set; bumped on every teardown/rewatch.
    generation: u64,
}

impl<W: WatchBackend> fmt::Debug for WatchRuntime<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRuntime")
            .field("core", &self.core)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl<W: WatchBackend> WatchRuntime<W> {
    pub fn new(
        core: Debouncer,
        builder: Builder,
        observer: Rc<dyn BuildObserver>,
        backend: W,
    ) -> Self {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        Self {
            core,
            builder,
            observer,
            backend,
            notice_tx,
            notice_rx,
            watchers: None,
            generation: 0,
        }
    }

    pub fn rebuild_handle(&self) -> RebuildHandle {
        RebuildHandle {
            tx: self.notice_tx.clone(),
        }
    }

    /// Main loop: builds once immediately, then rebuilds on every change
    /// until `shutdown` resolves. An in-flight build is dropped on shutdown.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!(source = ?self.builder.source(), "watch mode started");

        let mut shutdown = std::pin::pin!(shutdown);
        let mut slots = Slots::default();

        self.dispatch(WatchEvent::RebuildRequested, &mut slots);

        loop {
            let wake = tokio::select! {
                _ = &mut shutdown => Wake::Shutdown,
                notice = self.notice_rx.recv() => Wake::Notice(notice),
                _ = fire(&mut slots.debounce) => Wake::Debounce,
                _ = fire(&mut slots.pending) => Wake::Pending,
                outcome = finish(&mut slots.build) => Wake::Finished(outcome),
            };

            match wake {
                Wake::Shutdown => {
                    info!("shutdown requested; leaving watch mode");
                    break;
                }
                Wake::Notice(None) => {
                    info!("change channel closed; leaving watch mode");
                    break;
                }
                Wake::Notice(Some(ChangeNotice::Watched { generation, path })) => {
                    if generation != self.generation {
                        debug!(generation, current = self.generation, "stale change notice; ignoring");
                        continue;
                    }
                    info!("Change detected in {}", path.display());
                    self.dispatch(WatchEvent::RebuildRequested, &mut slots);
                }
                Wake::Notice(Some(ChangeNotice::Requested)) => {
                    debug!("rebuild requested");
                    self.dispatch(WatchEvent::RebuildRequested, &mut slots);
                }
                Wake::Debounce => {
                    slots.debounce = None;
                    self.dispatch(WatchEvent::DebounceElapsed, &mut slots);
                }
                Wake::Pending => {
                    slots.pending = None;
                    self.dispatch(WatchEvent::PendingElapsed, &mut slots);
                }
                Wake::Finished(outcome) => {
                    slots.build = None;
                    self.dispatch(WatchEvent::BuildFinished(outcome), &mut slots);
                }
            }
        }

        self.watchers = None;
        info!(builds = self.core.builds_started(), "watch loop exiting");
        Ok(())
    }

    fn dispatch(&mut self, event: WatchEvent, slots: &mut Slots) {
        debug!(?event, state = ?self.core.state(), "watch loop event");
        for command in self.core.step(event) {
            self.execute_command(command, slots);
        }
    }

    fn execute_command(&mut self, command: WatchCommand, slots: &mut Slots) {
        match command {
            WatchCommand::TearDownWatchers => {
                if self.watchers.take().is_some() {
                    debug!(generation = self.generation, "watchers torn down");
                }
                self.generation += 1;
            }
            WatchCommand::ArmDebounce(delay) => {
                slots.debounce = Some(Box::pin(sleep(delay)));
            }
            WatchCommand::ArmPending(delay) => {
                slots.pending = Some(Box::pin(sleep(delay)));
            }
            WatchCommand::StartBuild => {
                let builder = self.builder.clone();
                let observer = Rc::clone(&self.observer);
                slots.build = Some(Box::pin(async move { builder.build(observer.as_ref()).await }));
            }
            WatchCommand::Rewatch(paths) => self.rewatch(paths),
        }
    }

    fn rewatch(&mut self, paths: Vec<std::path::PathBuf>) {
        self.observer.on_rewatch(&paths);
        self.generation += 1;

        let notifier = ChangeNotifier::new(self.generation, self.notice_tx.clone());
        match self.backend.watch(&paths, notifier) {
            Ok(guard) => self.watchers = Some(guard),
            Err(err) => {
                // Without watchers only an explicit request can trigger the
                // next build.
                error!("could not watch files: {err:#}");
            }
        }
    }
}

async fn fire(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

async fn finish(build: &mut Option<BuildFuture>) -> BuildOutcome {
    match build {
        Some(future) => future.as_mut().await,
        None => std::future::pending().await,
    }
}
