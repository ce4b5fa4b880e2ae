// src/fs/mock.rs

use super::{FileSystem, FsFuture};
use anyhow::anyhow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, String>,
    read_delays: HashMap<PathBuf, Duration>,
    reads: Vec<PathBuf>,
    writes: Vec<PathBuf>,
}

/// In-memory filesystem for tests.
///
/// - Per-path read delays make it possible to finish reads out of order.
/// - Reads and writes are logged so tests can assert that no I/O happened.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the state from the others.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.lock()
            .files
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Delay every read of `path` by `delay`.
    pub fn set_read_delay(&self, path: impl AsRef<Path>, delay: Duration) {
        self.lock()
            .read_delays
            .insert(path.as_ref().to_path_buf(), delay);
    }

    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.lock().files.get(path.as_ref()).cloned()
    }

    /// Paths passed to `write`, in call order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.lock().writes.clone()
    }

    /// Paths passed to `read_to_string`, in call order.
    pub fn reads(&self) -> Vec<PathBuf> {
        self.lock().reads.clone()
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> FsFuture<String> {
        let path = path.to_path_buf();
        let delay = {
            let mut state = self.lock();
            state.reads.push(path.clone());
            state.read_delays.get(&path).copied()
        };
        let state = Arc::clone(&self.state);

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let state = state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            state
                .files
                .get(&path)
                .cloned()
                .ok_or_else(|| anyhow!("File not found: {:?}", path))
        })
    }

    fn write(&self, path: &Path, contents: String) -> FsFuture<()> {
        let path = path.to_path_buf();
        {
            let mut state = self.lock();
            state.writes.push(path.clone());
            state.files.insert(path, contents);
        }
        Box::pin(async { Ok(()) })
    }
}
