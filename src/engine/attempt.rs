// src/engine/attempt.rs

//! State owned by a single build attempt.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::engine::BuildOutcome;

/// Message used when the program returns without `done()` or `fail()`.
pub const NO_TERMINAL_MESSAGE: &str = "build program finished without calling done() or fail()";

#[derive(Debug, Default)]
struct AttemptState {
    dependencies: Vec<PathBuf>,
    outcome: Option<BuildOutcome>,
}

/// Shared handle to the dependency list and terminal event of one attempt.
///
/// Cloned into every capability closure. The first terminal call wins. I/O
/// capabilities keep running after that; only later terminal calls are
/// ignored.
#[derive(Debug, Clone, Default)]
pub struct Attempt {
    inner: Rc<RefCell<AttemptState>>,
}

impl Attempt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the dependency list. No deduplication.
    pub fn record_dependency(&self, path: PathBuf) {
        debug!(path = ?path, "recording build dependency");
        self.inner.borrow_mut().dependencies.push(path);
    }

    /// Snapshot of the dependencies recorded so far.
    pub fn dependencies(&self) -> Vec<PathBuf> {
        self.inner.borrow().dependencies.clone()
    }

    /// Raise `Done` with the current dependency list, then clear the list.
    ///
    /// Returns `false` if the attempt was already settled.
    pub fn done(&self) -> bool {
        let mut state = self.inner.borrow_mut();
        let dependencies = std::mem::take(&mut state.dependencies);
        if state.outcome.is_some() {
            warn!("done() called after the build already finished; ignoring");
            return false;
        }
        state.outcome = Some(BuildOutcome::Done(dependencies));
        true
    }

    /// Raise `Fail(message)`, then clear the dependency list.
    ///
    /// Returns `false` if the attempt was already settled.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        let message = message.into();
        let mut state = self.inner.borrow_mut();
        state.dependencies.clear();
        if state.outcome.is_some() {
            warn!(%message, "fail() called after the build already finished; ignoring");
            return false;
        }
        state.outcome = Some(BuildOutcome::Fail(message));
        true
    }

    /// Terminal event of the attempt. An attempt nobody settled is a failure.
    pub fn outcome(&self) -> BuildOutcome {
        self.inner
            .borrow_mut()
            .outcome
            .take()
            .unwrap_or_else(|| BuildOutcome::Fail(NO_TERMINAL_MESSAGE.to_string()))
    }
}
