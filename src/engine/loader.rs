// src/engine/loader.rs

//! Resolution of `load(...)` requests.
//!
//! An identifier resolves either to the inline content of the element or, if
//! the element has a `src` attribute, to the content of that file. External
//! files are appended to the attempt's dependency list at request time, so
//! the list follows request order and not completion order.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::document::{sanitize_id, SourceDocument};
use crate::engine::Attempt;
use crate::errors::CapabilityError;
use crate::fs::FileSystem;
use crate::watch::path_utils::resolve_relative;

/// A request that has been looked up but whose content may still be in flight.
enum Resolution {
    Inline(String),
    External {
        path: PathBuf,
        read: JoinHandle<anyhow::Result<String>>,
    },
}

#[derive(Debug)]
pub struct DependencyLoader {
    document: Rc<SourceDocument>,
    dir: PathBuf,
    fs: Arc<dyn FileSystem>,
    attempt: Attempt,
}

impl DependencyLoader {
    pub fn new(
        document: Rc<SourceDocument>,
        dir: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        attempt: Attempt,
    ) -> Self {
        Self {
            document,
            dir: dir.into(),
            fs,
            attempt,
        }
    }

    /// Resolve a single identifier.
    pub async fn load(&self, raw_id: &str) -> Result<String, CapabilityError> {
        let resolution = self.resolve(raw_id)?;
        settle(resolution).await
    }

    /// Resolve several identifiers.
    ///
    /// All lookups happen first (recording dependencies in input order) and
    /// the file reads overlap; results are then collected in input order.
    pub async fn load_many(&self, raw_ids: &[String]) -> Result<Vec<String>, CapabilityError> {
        let resolutions = raw_ids
            .iter()
            .map(|id| self.resolve(id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut contents = Vec::with_capacity(resolutions.len());
        for resolution in resolutions {
            contents.push(settle(resolution).await?);
        }
        Ok(contents)
    }

    fn resolve(&self, raw_id: &str) -> Result<Resolution, CapabilityError> {
        let id = sanitize_id(raw_id);
        let element = self
            .document
            .element_by_id(&id)
            .ok_or_else(|| CapabilityError::ElementNotFound(raw_id.to_string()))?;

        let Some(src) = element.src else {
            return Ok(Resolution::Inline(element.inner_html));
        };

        let path = resolve_relative(&self.dir, Path::new(&src));
        self.attempt.record_dependency(path.clone());
        debug!(id = %id, path = ?path, "loading external content");

        let read = tokio::spawn(self.fs.read_to_string(&path));
        Ok(Resolution::External { path, read })
    }
}

async fn settle(resolution: Resolution) -> Result<String, CapabilityError> {
    match resolution {
        Resolution::Inline(content) => Ok(content),
        Resolution::External { path, read } => {
            let reason = match read.await {
                Ok(Ok(content)) => return Ok(content),
                Ok(Err(err)) => err.root_cause().to_string(),
                Err(join_err) => join_err.to_string(),
            };
            warn!(path = ?path, %reason, "could not read dependency");
            Err(CapabilityError::ReadFailed { path, reason })
        }
    }
}
