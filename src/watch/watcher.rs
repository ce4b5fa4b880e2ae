// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::watch::path_utils::{dedup_preserving_order, same_path};

/// Message from a watcher set (or an explicit request) into the watch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeNotice {
    /// First change seen by the watcher set of `generation`.
    Watched { generation: u64, path: PathBuf },
    /// Rebuild requested without a file change.
    Requested,
}

/// One-shot sender handed to a watcher set.
///
/// Only the first call to [`ChangeNotifier::notify`] is forwarded.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    generation: u64,
    tx: mpsc::UnboundedSender<ChangeNotice>,
    fired: Arc<AtomicBool>,
}

impl ChangeNotifier {
    pub fn new(generation: u64, tx: mpsc::UnboundedSender<ChangeNotice>) -> Self {
        Self {
            generation,
            tx,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forward the change. Returns `false` if this notifier already fired or
    /// the watch loop is gone.
    pub fn notify(&self, path: PathBuf) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.tx
            .send(ChangeNotice::Watched {
                generation: self.generation,
                path,
            })
            .is_ok()
    }
}

/// Handle for a watcher set.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive
/// for as long as needed. Dropping this handle stops file watching.
pub struct WatchGuard {
    _inner: Option<RecommendedWatcher>,
}

impl WatchGuard {
    /// A guard that owns nothing, for backends without OS resources.
    pub fn inert() -> Self {
        Self { _inner: None }
    }
}

impl std::fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchGuard").finish()
    }
}

/// Trait abstracting how a watcher set is established.
///
/// Production code uses [`NotifyBackend`]; tests can provide their own
/// implementation that records path sets and fires changes on demand.
pub trait WatchBackend {
    fn watch(&mut self, paths: &[PathBuf], notifier: ChangeNotifier) -> Result<WatchGuard>;
}

/// Watcher backend on top of `notify`.
///
/// The parent directory of every path is watched non-recursively and events
/// are filtered down to the requested paths, so files replaced by an
/// editor's rename-on-save are still seen.
#[derive(Debug, Default, Clone)]
pub struct NotifyBackend;

impl WatchBackend for NotifyBackend {
    fn watch(&mut self, paths: &[PathBuf], notifier: ChangeNotifier) -> Result<WatchGuard> {
        let watched: Arc<Vec<PathBuf>> = Arc::new(paths.to_vec());
        let generation = notifier.generation();

        // Closure called synchronously by notify whenever an event arrives.
        let filter = Arc::clone(&watched);
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    let hit = event
                        .paths
                        .iter()
                        .find(|p| filter.iter().any(|w| same_path(w, p)));
                    if let Some(path) = hit {
                        if notifier.notify(path.clone()) {
                            debug!(path = ?path, generation, "watched file changed");
                        }
                    }
                }
                Err(err) => {
                    warn!("file watch error: {err}");
                }
            },
            Config::default(),
        )?;

        let dirs = dedup_preserving_order(
            watched
                .iter()
                .filter_map(|p| p.parent().map(|d| d.to_path_buf())),
        );
        for dir in &dirs {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .with_context(|| format!("watching directory {:?}", dir))?;
        }

        info!(files = watched.len(), generation, "file watchers started");
        Ok(WatchGuard {
            _inner: Some(watcher),
        })
    }
}
