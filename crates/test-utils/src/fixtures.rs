//! Source documents and on-disk projects for tests.

use std::path::{Path, PathBuf};

use bunny::config::BuildConfig;
use tempfile::TempDir;

/// Builder for a source HTML document.
///
/// ```ignore
/// let html = DocumentBuilder::new("save(load('frag'))")
///     .external("frag", "frag.html")
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    program: Option<String>,
    elements: Vec<String>,
}

impl DocumentBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            program: Some(program.to_string()),
            elements: Vec::new(),
        }
    }

    /// A document with no main script at all.
    pub fn without_program() -> Self {
        Self::default()
    }

    /// Element whose content is inline.
    pub fn inline(mut self, id: &str, content: &str) -> Self {
        self.elements
            .push(format!(r#"<div id="{id}">{content}</div>"#));
        self
    }

    /// Element whose content lives in `src`, relative to the document.
    pub fn external(mut self, id: &str, src: &str) -> Self {
        self.elements
            .push(format!(r#"<script id="{id}" src="{src}"></script>"#));
        self
    }

    pub fn build(self) -> String {
        let mut body = self.elements.join("\n");
        if let Some(program) = self.program {
            body.push_str(&format!("\n<script role=\"main\">\n{program}\n</script>"));
        }
        format!("<!DOCTYPE html>\n<html>\n<head></head>\n<body>\n{body}\n</body>\n</html>\n")
    }
}

/// A temporary project directory holding a source document and its files.
#[derive(Debug)]
pub struct TempProject {
    dir: TempDir,
}

impl TempProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    /// Canonical root, so paths compare equal to those the engine resolves.
    pub fn root(&self) -> PathBuf {
        self.dir
            .path()
            .canonicalize()
            .expect("failed to canonicalize temp dir")
    }

    pub fn path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: impl AsRef<Path>, content: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dir");
        }
        std::fs::write(&path, content).expect("failed to write fixture");
        path
    }

    pub fn read(&self, rel: impl AsRef<Path>) -> Option<String> {
        std::fs::read_to_string(self.path(rel)).ok()
    }

    /// Config for `source` (and optionally `target`), relative to the root.
    pub fn config(&self, source: &str, target: Option<&str>) -> BuildConfig {
        BuildConfig::new_unchecked(self.path(source), target.map(|t| self.path(t)))
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}
