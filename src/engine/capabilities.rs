// src/engine/capabilities.rs

//! The capability set exposed to a build program.
//!
//! A fresh Lua state is created for every attempt with these globals:
//! - `load(id | {ids...})` - element content, inline or from its `src` file
//! - `save(data)` - write the target file, then finish the build
//! - `saveFile(name, data)` - write a file next to the source document
//! - `done()` / `fail(message)` - finish the build
//! - `console.log/info/warn/error(...)` and `print(...)` - logging
//!
//! `io`, `os` and `debug` are never opened and `dofile`/`loadfile` are
//! removed, so the program reaches the filesystem only through this set.
//! This is namespacing, not isolation: the program is trusted.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use mlua::prelude::*;
use mlua::{LuaOptions, StdLib, Variadic};
use tracing::{error, info, warn};

use crate::document::SourceDocument;
use crate::engine::{Attempt, DependencyLoader};
use crate::errors::CapabilityError;
use crate::fs::FileSystem;
use crate::watch::path_utils::resolve_relative;

/// Log target for `console.*` output from build programs.
pub const CONSOLE_TARGET: &str = "bunny::console";

/// Everything a capability set is closed over, fixed at engine construction.
#[derive(Debug, Clone)]
pub struct CapabilityScope {
    /// Directory of the source document; relative paths resolve against it.
    pub dir: PathBuf,
    /// Destination of `save`. `None` makes `save` fail.
    pub target: Option<PathBuf>,
    pub fs: Arc<dyn FileSystem>,
}

#[derive(Debug, Clone, Copy)]
enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
}

fn sandbox_libs() -> StdLib {
    StdLib::TABLE | StdLib::STRING | StdLib::MATH | StdLib::UTF8 | StdLib::COROUTINE | StdLib::PACKAGE
}

/// Create the Lua state for one attempt, with the capability set installed.
pub fn create_sandbox(
    scope: &CapabilityScope,
    document: Rc<SourceDocument>,
    attempt: &Attempt,
) -> LuaResult<Lua> {
    let lua = Lua::new_with(sandbox_libs(), LuaOptions::default())?;
    restrict_globals(&lua, &scope.dir)?;

    let globals = lua.globals();
    let loader = Rc::new(DependencyLoader::new(
        document,
        scope.dir.clone(),
        Arc::clone(&scope.fs),
        attempt.clone(),
    ));
    globals.set("load", create_load(&lua, loader)?)?;
    globals.set("save", create_save(&lua, scope, attempt.clone())?)?;
    globals.set("saveFile", create_save_file(&lua, scope)?)?;

    let done_attempt = attempt.clone();
    let done = lua.create_function(move |_, ()| {
        done_attempt.done();
        Ok(())
    })?;
    globals.set("done", done)?;

    let fail_attempt = attempt.clone();
    let fail = lua.create_function(move |_, message: Option<LuaValue>| {
        let message = message.as_ref().map(display_value).unwrap_or_default();
        fail_attempt.fail(message);
        Ok(())
    })?;
    globals.set("fail", fail)?;

    let console = lua.create_table()?;
    console.set("log", create_console_fn(&lua, ConsoleLevel::Log)?)?;
    console.set("info", create_console_fn(&lua, ConsoleLevel::Info)?)?;
    console.set("warn", create_console_fn(&lua, ConsoleLevel::Warn)?)?;
    console.set("error", create_console_fn(&lua, ConsoleLevel::Error)?)?;
    globals.set("print", console.get::<LuaFunction>("log")?)?;
    globals.set("console", console)?;

    Ok(lua)
}

/// Drop file-reaching base functions and point `require` at the document dir.
fn restrict_globals(lua: &Lua, dir: &Path) -> LuaResult<()> {
    let globals = lua.globals();
    globals.set("dofile", LuaValue::Nil)?;
    globals.set("loadfile", LuaValue::Nil)?;

    let package: LuaTable = globals.get("package")?;
    let dir = dir.to_string_lossy();
    package.set("path", format!("{dir}/?.lua;{dir}/?/init.lua"))?;
    package.set("cpath", "")?;
    Ok(())
}

fn create_load(lua: &Lua, loader: Rc<DependencyLoader>) -> LuaResult<LuaFunction> {
    lua.create_async_function(move |lua, request: LuaValue| {
        let loader = Rc::clone(&loader);
        async move {
            match request {
                LuaValue::String(id) => {
                    let content = loader
                        .load(&id.to_string_lossy())
                        .await
                        .map_err(LuaError::external)?;
                    Ok(LuaValue::String(lua.create_string(&content)?))
                }
                LuaValue::Table(ids) => {
                    let ids = ids
                        .sequence_values::<String>()
                        .collect::<LuaResult<Vec<_>>>()?;
                    let contents = loader.load_many(&ids).await.map_err(LuaError::external)?;
                    Ok(LuaValue::Table(lua.create_sequence_from(contents)?))
                }
                other => Err(LuaError::external(format!(
                    "load() expects an element id or a list of ids, got {}",
                    other.type_name()
                ))),
            }
        }
    })
}

fn create_save(lua: &Lua, scope: &CapabilityScope, attempt: Attempt) -> LuaResult<LuaFunction> {
    let target = scope.target.clone();
    let fs = Arc::clone(&scope.fs);

    lua.create_async_function(move |_, data: String| {
        let target = target.clone();
        let fs = Arc::clone(&fs);
        let attempt = attempt.clone();
        async move {
            let target = target.ok_or_else(|| LuaError::external(CapabilityError::TargetNotSet))?;
            write_text(fs.as_ref(), &target, data).await?;
            attempt.done();
            Ok(())
        }
    })
}

fn create_save_file(lua: &Lua, scope: &CapabilityScope) -> LuaResult<LuaFunction> {
    let dir = scope.dir.clone();
    let fs = Arc::clone(&scope.fs);

    lua.create_async_function(move |_, (name, data): (String, String)| {
        let path = resolve_relative(&dir, Path::new(&name));
        let fs = Arc::clone(&fs);
        async move { write_text(fs.as_ref(), &path, data).await }
    })
}

async fn write_text(fs: &dyn FileSystem, path: &Path, data: String) -> LuaResult<()> {
    fs.write(path, data).await.map_err(|err| {
        let reason = err.root_cause().to_string();
        error!(path = ?path, %reason, "could not write file");
        LuaError::external(CapabilityError::WriteFailed {
            path: path.to_path_buf(),
            reason,
        })
    })
}

fn create_console_fn(lua: &Lua, level: ConsoleLevel) -> LuaResult<LuaFunction> {
    lua.create_function(move |_, args: Variadic<LuaValue>| {
        let line = args.iter().map(display_value).collect::<Vec<_>>().join(" ");
        match level {
            ConsoleLevel::Log | ConsoleLevel::Info => info!(target: CONSOLE_TARGET, "{line}"),
            ConsoleLevel::Warn => warn!(target: CONSOLE_TARGET, "{line}"),
            ConsoleLevel::Error => error!(target: CONSOLE_TARGET, "{line}"),
        }
        Ok(())
    })
}

/// Render a Lua value the way `tostring` would.
fn display_value(value: &LuaValue) -> String {
    match value {
        LuaValue::Nil => String::new(),
        LuaValue::String(s) => s.to_string_lossy(),
        other => other
            .to_string()
            .unwrap_or_else(|_| format!("<{}>", other.type_name())),
    }
}
