//! Failure-isolated callback invocation.
//!
//! Every dispatch protocol calls extension code through [`invoke_isolated`].
//! Returned errors and panics both come back as a [`CallbackFailure`] value
//! after being logged with the owning extension and the hook name.

use std::any::Any;
use std::backtrace::BacktraceStatus;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use tracing::warn;

use extkit_core::ExtError;

use crate::types::HookFn;

/// Lines of captured backtrace kept on a failure.
const BACKTRACE_EXCERPT_LINES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The callback returned `Err`.
    Error,
    /// The callback panicked.
    Panic,
}

/// A callback invocation that did not produce a value.
#[derive(Debug, Clone)]
pub struct CallbackFailure {
    pub owner: String,
    pub hook: String,
    pub kind: FailureKind,
    pub message: String,
    /// Source chain of the error, outermost first (excluding `message`).
    pub causes: Vec<String>,
    /// Head of the error's backtrace when one was captured (`RUST_BACKTRACE`).
    pub backtrace: Option<String>,
}

impl CallbackFailure {
    pub fn into_error(self) -> ExtError {
        ExtError::CallbackRuntime { owner: self.owner, hook: self.hook, message: self.message }
    }
}

/// Run `func` with `input`, turning errors and panics into a logged
/// [`CallbackFailure`].
pub fn invoke_isolated(
    hook_name: &str,
    owner: &str,
    func: &dyn HookFn,
    input: Value,
) -> Result<Value, CallbackFailure> {
    let failure = match panic::catch_unwind(AssertUnwindSafe(|| func.call(input))) {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(err)) => {
            let backtrace = match err.backtrace().status() {
                BacktraceStatus::Captured => Some(
                    err.backtrace()
                        .to_string()
                        .lines()
                        .take(BACKTRACE_EXCERPT_LINES)
                        .collect::<Vec<_>>()
                        .join("\n"),
                ),
                _ => None,
            };
            CallbackFailure {
                owner: owner.to_string(),
                hook: hook_name.to_string(),
                kind: FailureKind::Error,
                message: err.to_string(),
                causes: err.chain().skip(1).map(ToString::to_string).collect(),
                backtrace,
            }
        }
        Err(payload) => CallbackFailure {
            owner: owner.to_string(),
            hook: hook_name.to_string(),
            kind: FailureKind::Panic,
            message: panic_message(payload.as_ref()),
            causes: Vec::new(),
            backtrace: None,
        },
    };

    warn!(
        hook = %failure.hook,
        owner = %failure.owner,
        kind = ?failure.kind,
        error = %failure.message,
        causes = ?failure.causes,
        backtrace = failure.backtrace.as_deref().unwrap_or(""),
        "Extension callback failed; skipping it"
    );
    Err(failure)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("callback panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("callback panicked: {s}")
    } else {
        "callback panicked with a non-string payload".to_string()
    }
}
