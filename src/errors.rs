// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Two families live here:
//! - [`BunnyError`]: fatal, configuration-level errors that stop the process
//!   before (or instead of) running a build.
//! - [`CapabilityError`]: per-build errors raised by the capability set while
//!   a build program runs. These never escape a build attempt; they are
//!   converted into a failed build.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BunnyError {
    #[error("Unable to read input file {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Wrong port {0}, port should be number between 1024 and 65535")]
    InvalidPort(u32),

    #[error("Target file should be set for {0}. You can do it by passing second non-flag argument")]
    TargetRequired(&'static str),

    #[error("Cannot run dev server on port {port}: {source}")]
    BindFailed {
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors surfaced to the build program by `load`, `save` and `saveFile`.
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("Could not find element with id: {0}")]
    ElementNotFound(String),

    #[error("Could not read file: {}: {reason}", path.display())]
    ReadFailed { path: PathBuf, reason: String },

    #[error("Could not write file: {}: {reason}", path.display())]
    WriteFailed { path: PathBuf, reason: String },

    #[error("Target file isn't set, you can pass it as second non-flag argument")]
    TargetNotSet,
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BunnyError>;
