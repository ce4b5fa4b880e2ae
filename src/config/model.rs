// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Delay used to coalesce bursts of change notifications into one build.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Configuration exactly as it came from the command line.
///
/// Paths may be relative; nothing has been checked yet. Convert into a
/// [`BuildConfig`] with `BuildConfig::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct RawBuildConfig {
    pub source: PathBuf,
    pub target: Option<PathBuf>,
    /// Directory relative paths are resolved against (normally the CWD).
    pub cwd: PathBuf,
}

/// Validated build configuration.
///
/// `source` is absolute and known to exist at startup. It is the only
/// resource, together with `target`, shared across build attempts.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    source: PathBuf,
    source_dir: PathBuf,
    target: Option<PathBuf>,
    debounce: Duration,
}

impl BuildConfig {
    /// Construct without touching the filesystem. Callers are expected to
    /// pass absolute paths.
    pub fn new_unchecked(source: PathBuf, target: Option<PathBuf>) -> Self {
        let source_dir = source
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        Self {
            source,
            source_dir,
            target,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Override the debounce window. Not exposed on the CLI.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

/// Validated dev server settings.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    pub port: u16,
    pub target: PathBuf,
    pub open_browser: bool,
}

impl DevServerConfig {
    /// URL the dev server is reachable on from the local machine.
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

/// Which of the three entry points to run.
#[derive(Debug, Clone)]
pub enum RunMode {
    Once,
    Watch,
    Dev(DevServerConfig),
}
