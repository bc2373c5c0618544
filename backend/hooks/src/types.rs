/// Callback and result types shared by registration and dispatch.
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

use extkit_core::{CallbackState, ExtError, SemVer};

// ---------------------------------------------------------------------------
// Callback function
// ---------------------------------------------------------------------------

/// A callback an extension attaches to a hook or plugin slot.
///
/// Any `Fn(Value) -> anyhow::Result<Value>` closure qualifies.
pub trait HookFn: Send + Sync {
    fn call(&self, input: Value) -> Result<Value>;
}

impl<F> HookFn for F
where
    F: Fn(Value) -> Result<Value> + Send + Sync,
{
    fn call(&self, input: Value) -> Result<Value> {
        self(input)
    }
}

/// Priority that places a hook callback at the front of its hook's list.
/// Every other value appends.
pub const FRONT_PRIORITY: i32 = -1;

// ---------------------------------------------------------------------------
// Registration specs
// ---------------------------------------------------------------------------

/// A hook callback plus the API version it expects.
#[derive(Clone)]
pub struct HookSpec {
    pub func: Arc<dyn HookFn>,
    pub api: String,
    pub priority: i32,
}

impl HookSpec {
    pub fn new<F>(api: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self { func: Arc::new(func), api: api.into(), priority: 0 }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Shorthand for `with_priority(FRONT_PRIORITY)`.
    pub fn first(self) -> Self {
        self.with_priority(FRONT_PRIORITY)
    }
}

impl fmt::Debug for HookSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookSpec")
            .field("api", &self.api)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// A plugin callback plus the API version it expects.
#[derive(Clone)]
pub struct PluginSpec {
    pub func: Arc<dyn HookFn>,
    pub api: String,
}

impl PluginSpec {
    pub fn new<F>(api: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self { func: Arc::new(func), api: api.into() }
    }
}

impl fmt::Debug for PluginSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginSpec").field("api", &self.api).finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// First-true envelope
// ---------------------------------------------------------------------------

/// Value threaded through `run_first_true_hook`.
///
/// On the wire this is `{"data": ..., "ranSomething": ...}`. A callback that
/// handled the input returns it with a truthy `ranSomething` to stop the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HookEnvelope {
    pub data: Value,
    #[serde(rename = "ranSomething")]
    pub ran_something: bool,
}

impl HookEnvelope {
    pub fn new(data: Value) -> Self {
        Self { data, ran_something: false }
    }

    pub fn handled(data: Value) -> Self {
        Self { data, ran_something: true }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "data": self.data, "ranSomething": self.ran_something })
    }

    /// Read a callback's return value as an envelope.
    ///
    /// A missing `data` is `null`. `ranSomething` is false when missing,
    /// `false`, `null`, `0` or `""`, and true for anything else. Only
    /// non-object values are rejected.
    pub fn from_value(value: Value) -> Result<Self, ExtError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(ExtError::Other(anyhow::anyhow!(
                    "hook envelope must be a JSON object, got {other}"
                )));
            }
        };
        let ran_something = map.get("ranSomething").is_some_and(is_truthy);
        let data = map.remove("data").unwrap_or(Value::Null);
        Ok(Self { data, ran_something })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

// ---------------------------------------------------------------------------
// Introspection and declaration reports
// ---------------------------------------------------------------------------

/// Read-only view of a registered callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackInfo {
    pub owner: String,
    pub api: SemVer,
    pub priority: i32,
    pub state: CallbackState,
}

/// A callback whose state changed because its namespace was (re)declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateTransition {
    pub owner: String,
    pub from: CallbackState,
    pub to: CallbackState,
}

/// Outcome of `declare_hook` / `declare_plugin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Declaration {
    pub namespace: String,
    pub api: SemVer,
    pub previous: Option<SemVer>,
    pub transitions: Vec<StateTransition>,
}

impl Declaration {
    /// True when an earlier declaration carried a different version.
    pub fn is_mismatch(&self) -> bool {
        self.previous.is_some_and(|prev| prev != self.api)
    }
}
