//! Hook and plugin registry.
//!
//! Extensions register callbacks under hook names (many per hook) or under
//! `(plugin type, plugin name)` slots (one per slot), each tagged with the API
//! version it was written against. Namespaces declare the API version they
//! provide; callbacks that do not fit are kept but disabled. Dispatch runs
//! only enabled callbacks and never lets one extension's failure escape.

pub mod dispatch;
pub mod invoke;
pub mod manifest;
pub mod registry;
pub mod types;

pub use extkit_core::{CallbackState, DuplicatePolicy, ExtError, SemVer, version_check};
pub use invoke::{CallbackFailure, FailureKind, invoke_isolated};
pub use manifest::{ExtensionData, ExtensionRecord};
pub use registry::ExtensionRegistry;
pub use types::{
    CallbackInfo, Declaration, FRONT_PRIORITY, HookEnvelope, HookFn, HookSpec, PluginSpec,
    StateTransition,
};
