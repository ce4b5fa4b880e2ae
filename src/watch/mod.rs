// src/watch/mod.rs

//! Watch-and-rebuild loop.
//!
//! This module is responsible for:
//! - the pure debounce state machine ([`debouncer`]), which decides whether a
//!   rebuild request starts a build, is deferred or is absorbed;
//! - one-shot filesystem watchers on top of `notify` ([`watcher`]);
//! - the async shell tying both to the build engine ([`runtime`]).
//!
//! It does **not** know how a build works; it only sees `BuildOutcome`s and
//! the dependency lists they carry.

pub mod debouncer;
pub mod path_utils;
pub mod runtime;
pub mod watcher;

pub use debouncer::{Debouncer, WatchCommand, WatchEvent, WatchState};
pub use runtime::{RebuildHandle, WatchRuntime};
pub use watcher::{ChangeNotice, ChangeNotifier, NotifyBackend, WatchBackend, WatchGuard};
