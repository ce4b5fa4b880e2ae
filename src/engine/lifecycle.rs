// src/engine/lifecycle.rs

//! One build attempt: `building -> (done | fail)`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::time::Instant;
use tracing::debug;

use crate::config::BuildConfig;
use crate::engine::capabilities::CapabilityScope;
use crate::engine::{execute, BuildOutcome};
use crate::fs::FileSystem;
use crate::observer::BuildObserver;

/// Runs build attempts for one source document.
///
/// Cheap to clone; the watch loop clones it into every build future.
#[derive(Debug, Clone)]
pub struct Builder {
    source: PathBuf,
    scope: CapabilityScope,
}

impl Builder {
    pub fn new(config: &BuildConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            source: config.source().to_path_buf(),
            scope: CapabilityScope {
                dir: config.source_dir().to_path_buf(),
                target: config.target().map(Path::to_path_buf),
                fs,
            },
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Run one attempt, notifying `observer` of `Building` and of the
    /// terminal event. Always resolves; failures are in the outcome.
    pub async fn build(&self, observer: &dyn BuildObserver) -> BuildOutcome {
        let started = Instant::now();
        observer.on_building();

        let outcome = self.attempt().await;
        let elapsed = started.elapsed();

        match &outcome {
            BuildOutcome::Done(dependencies) => observer.on_done(dependencies, elapsed),
            BuildOutcome::Fail(message) => observer.on_fail(message, elapsed),
        }
        outcome
    }

    async fn attempt(&self) -> BuildOutcome {
        debug!(source = ?self.source, "reading source document");
        let text = match self.scope.fs.read_to_string(&self.source).await {
            Ok(text) => text,
            Err(err) => {
                return BuildOutcome::Fail(format!(
                    "Unable to read input file {}: {}",
                    self.source.display(),
                    err.root_cause()
                ));
            }
        };

        execute(&text, &self.scope).await
    }
}
