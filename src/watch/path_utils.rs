// src/watch/path_utils.rs

//! Utility functions for path handling in the engine and the watcher.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` against `base` and normalise `.` / `..` lexically.
///
/// Absolute `path`s ignore `base`. No filesystem access happens, so the
/// result is stable even for files that do not exist yet (a `saveFile`
/// destination, a dependency that was deleted).
pub fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };
    normalize(&joined)
}

/// Lexically normalise a path: drop `.` segments and fold `..` into the
/// previous normal segment. `..` above the root is dropped.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether an event path refers to the same file as a watched path.
///
/// - First we compare the paths directly (the common case, since events are
///   reported relative to the directory we registered).
/// - If that fails, we canonicalize both and try again. This helps on
///   platforms (notably macOS) where different absolute prefixes may be used
///   for the same underlying directory (e.g. `/private/var/...`).
pub fn same_path(watched: &Path, event_path: &Path) -> bool {
    if watched == event_path {
        return true;
    }

    match (watched.canonicalize(), event_path.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => match (watched.parent(), event_path.parent()) {
            // A deleted file cannot be canonicalized; compare parent + name.
            (Some(wp), Some(ep)) => {
                watched.file_name() == event_path.file_name()
                    && match (wp.canonicalize(), ep.canonicalize()) {
                        (Ok(a), Ok(b)) => a == b,
                        _ => false,
                    }
            }
            _ => false,
        },
    }
}

/// Remove duplicates, keeping the first occurrence of each path.
pub fn dedup_preserving_order(paths: impl IntoIterator<Item = PathBuf>) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    for path in paths {
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}
