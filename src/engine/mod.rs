// src/engine/mod.rs

//! Build engine: runs the Lua build program embedded in the source document.
//!
//! This module ties together:
//! - the per-attempt state (dependency list + terminal event) in [`attempt`]
//! - `load` resolution and dependency accumulation in [`loader`]
//! - the capability set exposed to the program in [`capabilities`]
//! - locating and executing the program in [`executor`]
//! - the `building -> done | fail` sequence in [`lifecycle`]
//!
//! Everything here runs on one logical thread of control. Lua values are
//! `!Send`, so a build is a local future driven by whoever awaits it.

use std::path::PathBuf;

pub mod attempt;
pub mod capabilities;
pub mod executor;
pub mod lifecycle;
pub mod loader;

pub use attempt::Attempt;
pub use capabilities::CapabilityScope;
pub use executor::execute;
pub use lifecycle::Builder;
pub use loader::DependencyLoader;

/// Terminal result of one build attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// The program called `done()` (directly or through `save`). Carries the
    /// dependency list in request order, duplicates included.
    Done(Vec<PathBuf>),
    Fail(String),
}

impl BuildOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, BuildOutcome::Done(_))
    }
}

/// Events of the build lifecycle: exactly one `Building` followed by exactly
/// one terminal event per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Building,
    Done(Vec<PathBuf>),
    Fail(String),
}

impl From<BuildOutcome> for BuildEvent {
    fn from(outcome: BuildOutcome) -> Self {
        match outcome {
            BuildOutcome::Done(deps) => BuildEvent::Done(deps),
            BuildOutcome::Fail(message) => BuildEvent::Fail(message),
        }
    }
}
