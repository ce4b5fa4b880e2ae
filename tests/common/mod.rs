#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use bunny::config::BuildConfig;
use bunny::engine::{BuildOutcome, Builder};
use bunny::fs::MockFileSystem;

pub use bunny_test_utils::fixtures::{DocumentBuilder, TempProject};
pub use bunny_test_utils::recording::{RecordingObserver, RecordingWatchBackend};
pub use bunny_test_utils::{init_tracing, with_timeout};

pub const SOURCE: &str = "/project/index.html";
pub const TARGET: &str = "/project/out.html";

/// In-memory project holding `html` as the source document.
pub fn mock_project(html: &str) -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file(SOURCE, html);
    fs
}

pub fn mock_builder(fs: &MockFileSystem, target: Option<&str>) -> Builder {
    let config = BuildConfig::new_unchecked(PathBuf::from(SOURCE), target.map(PathBuf::from));
    Builder::new(&config, Arc::new(fs.clone()))
}

/// Run one attempt against the mock filesystem.
pub async fn mock_build(fs: &MockFileSystem, target: Option<&str>) -> BuildOutcome {
    mock_builder(fs, target)
        .build(&RecordingObserver::new())
        .await
}
