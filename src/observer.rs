// src/observer.rs

//! Passive observers of the build lifecycle.
//!
//! The engine and the watch loop notify an observer; they never depend on
//! how progress is displayed. [`LogObserver`] reports through `tracing`.

use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use tracing::{error, info};

/// Receives lifecycle notifications. All methods default to no-ops.
pub trait BuildObserver {
    fn on_building(&self) {}

    fn on_done(&self, _dependencies: &[PathBuf], _elapsed: Duration) {}

    fn on_fail(&self, _message: &str, _elapsed: Duration) {}

    /// Watch mode only: the set of paths watched for the next change.
    fn on_rewatch(&self, _paths: &[PathBuf]) {}
}

/// Reports build progress as log records.
#[derive(Debug, Default, Clone)]
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

impl BuildObserver for LogObserver {
    fn on_building(&self) {
        info!("Building");
    }

    fn on_done(&self, dependencies: &[PathBuf], elapsed: Duration) {
        info!(
            dependencies = dependencies.len(),
            "Built in {}",
            format_elapsed(elapsed)
        );
    }

    fn on_fail(&self, message: &str, elapsed: Duration) {
        error!("Failed in {}. Reason: {message}", format_elapsed(elapsed));
    }

    fn on_rewatch(&self, paths: &[PathBuf]) {
        let listing = paths
            .iter()
            .map(|p| format!("- {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n");
        info!("Watched files:\n{listing}");
    }
}

/// Fans every notification out to several observers, in order.
#[derive(Default, Clone)]
pub struct CompositeObserver {
    observers: Vec<Rc<dyn BuildObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Rc<dyn BuildObserver>>) -> Self {
        Self { observers }
    }
}

impl BuildObserver for CompositeObserver {
    fn on_building(&self) {
        for o in &self.observers {
            o.on_building();
        }
    }

    fn on_done(&self, dependencies: &[PathBuf], elapsed: Duration) {
        for o in &self.observers {
            o.on_done(dependencies, elapsed);
        }
    }

    fn on_fail(&self, message: &str, elapsed: Duration) {
        for o in &self.observers {
            o.on_fail(message, elapsed);
        }
    }

    fn on_rewatch(&self, paths: &[PathBuf]) {
        for o in &self.observers {
            o.on_rewatch(paths);
        }
    }
}

/// `"1s 23ms"`, omitting zero parts; `"0ms"` when both are zero.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    let parts: Vec<String> = [(secs, "s"), (u64::from(millis), "ms")]
        .into_iter()
        .filter(|(value, _)| *value > 0)
        .map(|(value, unit)| format!("{value}{unit}"))
        .collect();

    if parts.is_empty() {
        "0ms".to_string()
    } else {
        parts.join(" ")
    }
}
