// src/engine/executor.rs

//! Locates the build program in a document and runs it.

use std::rc::Rc;

use tracing::debug;

use crate::document::{SourceDocument, MAIN_SELECTOR};
use crate::engine::capabilities::{create_sandbox, CapabilityScope};
use crate::engine::{Attempt, BuildOutcome};

/// Name the program chunk is reported under in Lua error messages.
const CHUNK_NAME: &str = "=main";

/// Parse `text`, find the main script and run it against a fresh capability
/// set.
///
/// Never returns an error: a missing main element, a Lua runtime error or a
/// failed capability call all become [`BuildOutcome::Fail`].
pub async fn execute(text: &str, scope: &CapabilityScope) -> BuildOutcome {
    let document = Rc::new(SourceDocument::parse(text));

    let Some(program) = document.main_program() else {
        return BuildOutcome::Fail(format!(
            "Could not find main script in input file with given selector: {MAIN_SELECTOR}"
        ));
    };

    let attempt = Attempt::new();
    let lua = match create_sandbox(scope, Rc::clone(&document), &attempt) {
        Ok(lua) => lua,
        Err(err) => {
            return BuildOutcome::Fail(format!(
                "Could not prepare build context: {}",
                error_message(&err)
            ));
        }
    };

    let result = lua.load(program.as_str()).set_name(CHUNK_NAME).exec_async().await;
    if let Err(err) = result {
        debug!(error = %err, "build program raised an error");
        attempt.fail(error_message(&err));
    }
    drop(lua);

    attempt.outcome()
}

/// Root-cause text of a Lua error, without the stack traceback.
pub fn error_message(err: &mlua::Error) -> String {
    match err {
        mlua::Error::CallbackError { cause, .. } => error_message(cause),
        mlua::Error::WithContext { cause, .. } => error_message(cause),
        mlua::Error::ExternalError(inner) => inner.to_string(),
        mlua::Error::RuntimeError(message) => strip_traceback(message),
        other => strip_traceback(&other.to_string()),
    }
}

fn strip_traceback(message: &str) -> String {
    match message.find("\nstack traceback:") {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    }
}
