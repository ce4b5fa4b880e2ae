//! Test doubles for the observer and watcher seams.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bunny::engine::BuildEvent;
use bunny::observer::BuildObserver;
use bunny::watch::{ChangeNotifier, WatchBackend, WatchGuard};
use tokio::sync::Notify;

/// Observer that records every lifecycle notification.
///
/// Single-threaded, like the watch loop it observes: share it through `Rc`.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: RefCell<Vec<BuildEvent>>,
    rewatches: RefCell<Vec<Vec<PathBuf>>>,
    changed: Notify,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BuildEvent> {
        self.events.borrow().clone()
    }

    /// Terminal events only, in order.
    pub fn outcomes(&self) -> Vec<BuildEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|e| !matches!(e, BuildEvent::Building))
            .cloned()
            .collect()
    }

    pub fn builds_started(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, BuildEvent::Building))
            .count()
    }

    pub fn rewatches(&self) -> Vec<Vec<PathBuf>> {
        self.rewatches.borrow().clone()
    }

    /// Wait until at least `count` rewatches happened. A rewatch marks the
    /// end of a build cycle in watch mode.
    pub async fn wait_for_rewatches(&self, count: usize) {
        loop {
            let notified = self.changed.notified();
            if self.rewatches.borrow().len() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Wait until at least `count` terminal events were recorded.
    pub async fn wait_for_outcomes(&self, count: usize) {
        loop {
            let notified = self.changed.notified();
            if self.outcomes().len() >= count {
                return;
            }
            notified.await;
        }
    }

    fn record(&self, event: BuildEvent) {
        self.events.borrow_mut().push(event);
        self.changed.notify_waiters();
    }
}

impl BuildObserver for RecordingObserver {
    fn on_building(&self) {
        self.record(BuildEvent::Building);
    }

    fn on_done(&self, dependencies: &[PathBuf], _elapsed: Duration) {
        self.record(BuildEvent::Done(dependencies.to_vec()));
    }

    fn on_fail(&self, message: &str, _elapsed: Duration) {
        self.record(BuildEvent::Fail(message.to_string()));
    }

    fn on_rewatch(&self, paths: &[PathBuf]) {
        self.rewatches.borrow_mut().push(paths.to_vec());
        self.changed.notify_waiters();
    }
}

#[derive(Debug, Default)]
struct BackendState {
    watched: Vec<Vec<PathBuf>>,
    notifiers: Vec<ChangeNotifier>,
}

/// Watch backend that records path sets and fires changes on demand.
///
/// Clones share state: hand one clone to the runtime and keep another to
/// drive it.
#[derive(Debug, Clone, Default)]
pub struct RecordingWatchBackend {
    state: Arc<Mutex<BackendState>>,
}

impl RecordingWatchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every path set passed to `watch`, in order.
    pub fn watched(&self) -> Vec<Vec<PathBuf>> {
        self.state.lock().unwrap().watched.clone()
    }

    /// Report a change to `path` through the most recent watcher set.
    /// Returns `false` if there is none or it already fired.
    pub fn trigger(&self, path: impl AsRef<Path>) -> bool {
        let state = self.state.lock().unwrap();
        match state.notifiers.last() {
            Some(notifier) => notifier.notify(path.as_ref().to_path_buf()),
            None => false,
        }
    }

    /// Report a change through an earlier watcher set (0-based).
    pub fn trigger_set(&self, index: usize, path: impl AsRef<Path>) -> bool {
        let state = self.state.lock().unwrap();
        match state.notifiers.get(index) {
            Some(notifier) => notifier.notify(path.as_ref().to_path_buf()),
            None => false,
        }
    }
}

impl WatchBackend for RecordingWatchBackend {
    fn watch(&mut self, paths: &[PathBuf], notifier: ChangeNotifier) -> anyhow::Result<WatchGuard> {
        let mut state = self.state.lock().unwrap();
        state.watched.push(paths.to_vec());
        state.notifiers.push(notifier);
        Ok(WatchGuard::inert())
    }
}
