// src/fs/mod.rs

//! Filesystem seam used by the build engine.
//!
//! Every operation returns a boxed `'static` future so reads for
//! `load([...])` can be spawned and overlap, while the caller still awaits
//! them in request order.

use std::fmt::Debug;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use anyhow::{Context, Result};

pub mod mock;

pub use mock::MockFileSystem;

/// Boxed future returned by [`FileSystem`] operations.
pub type FsFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'static>>;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> FsFuture<String>;

    /// Write UTF-8 text, creating parent directories as needed.
    fn write(&self, path: &Path, contents: String) -> FsFuture<()>;
}

/// Implementation that uses `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> FsFuture<String> {
        let path = path.to_path_buf();
        Box::pin(async move {
            tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("reading file {:?}", path))
        })
    }

    fn write(&self, path: &Path, contents: String) -> FsFuture<()> {
        let path: PathBuf = path.to_path_buf();
        Box::pin(async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating dir {:?}", parent))?;
            }
            tokio::fs::write(&path, contents)
                .await
                .with_context(|| format!("writing to file {:?}", path))
        })
    }
}
