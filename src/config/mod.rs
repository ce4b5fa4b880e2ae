// src/config/mod.rs

//! Configuration for a bunny run.
//!
//! Responsibilities:
//! - Define the unvalidated and validated data model (`model.rs`).
//! - Validate startup invariants: source exists, port range, target present
//!   when the dev server needs one (`validate.rs`).
//!
//! Every error produced here is fatal: no build attempt is made.

pub mod model;
pub mod validate;

pub use model::{BuildConfig, DevServerConfig, RawBuildConfig, RunMode, DEFAULT_DEBOUNCE};
pub use validate::{resolve_run_mode, validate_port};
