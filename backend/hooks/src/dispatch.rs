/// Dispatch protocols.
///
/// Each protocol runs only enabled callbacks, in list order, and calls every
/// one of them through `invoke_isolated`:
/// 1. `run_hook_chain` — fold a value through every callback
/// 2. `run_first_true_hook` — stop at the first callback that reports it handled the data
/// 3. `run_hooks` — broadcast the same data, ignore results
/// 4. `run_plugin` — call the single callback in a `(type, name)` slot
use serde_json::Value;
use tracing::{debug, warn};

use extkit_core::ExtError;

use crate::invoke::invoke_isolated;
use crate::registry::ExtensionRegistry;
use crate::types::HookEnvelope;

impl ExtensionRegistry {
    /// Pass `initial` through every enabled callback, each receiving the
    /// previous one's output. Returns `initial` untouched when nothing runs.
    ///
    /// A failing callback is skipped: the value it was given flows on to the
    /// next callback.
    pub fn run_hook_chain(&self, hook_name: &str, initial: Value) -> Value {
        let Some(namespace) = self.hooks.get(hook_name) else {
            return initial;
        };

        namespace.enabled().fold(initial, |value, callback| {
            debug!(hook = %hook_name, owner = %callback.owner, "Running chain callback");
            invoke_isolated(hook_name, &callback.owner, callback.func.as_ref(), value.clone())
                .unwrap_or(value)
        })
    }

    /// Offer `data` to each enabled callback until one returns an envelope
    /// with a truthy `ranSomething`.
    ///
    /// Each callback receives the current envelope and its return object
    /// replaces it. A callback that fails, or returns something other than a
    /// JSON object, leaves the current envelope in place.
    pub fn run_first_true_hook(&self, hook_name: &str, data: Value) -> HookEnvelope {
        let mut envelope = HookEnvelope::new(data);
        let Some(namespace) = self.hooks.get(hook_name) else {
            return envelope;
        };

        for callback in namespace.enabled() {
            let Ok(returned) =
                invoke_isolated(hook_name, &callback.owner, callback.func.as_ref(), envelope.to_value())
            else {
                continue;
            };

            match HookEnvelope::from_value(returned) {
                Ok(next) => envelope = next,
                Err(e) => {
                    warn!(
                        hook = %hook_name,
                        owner = %callback.owner,
                        error = %e,
                        "Callback returned a non-object in place of a hook envelope; ignoring it"
                    );
                    continue;
                }
            }

            if envelope.ran_something {
                debug!(hook = %hook_name, owner = %callback.owner, "Hook handled; stopping");
                break;
            }
        }
        envelope
    }

    /// Hand `data` to every enabled callback. Results are discarded.
    pub fn run_hooks(&self, hook_name: &str, data: &Value) {
        let Some(namespace) = self.hooks.get(hook_name) else {
            return;
        };

        for callback in namespace.enabled() {
            debug!(hook = %hook_name, owner = %callback.owner, "Running broadcast callback");
            let _ = invoke_isolated(hook_name, &callback.owner, callback.func.as_ref(), data.clone());
        }
    }

    /// Call the plugin in slot `(hook_name, plugin_name)` with `args`.
    ///
    /// `Ok(None)` means the plugin is absent, disabled, or failed while
    /// running. With `required` set, absent or disabled becomes
    /// `Err(MissingRequiredPlugin)`; a runtime failure still yields `Ok(None)`.
    pub fn run_plugin(
        &self,
        hook_name: &str,
        plugin_name: &str,
        args: Value,
        required: bool,
    ) -> Result<Option<Value>, ExtError> {
        let callback = self
            .plugins
            .get(hook_name)
            .and_then(|ns| ns.entries.get(plugin_name))
            .filter(|cb| cb.state.is_enabled());

        let Some(callback) = callback else {
            if required {
                return Err(ExtError::MissingRequiredPlugin {
                    hook: hook_name.to_string(),
                    plugin: plugin_name.to_string(),
                });
            }
            debug!(hook = %hook_name, plugin = %plugin_name, "No enabled plugin");
            return Ok(None);
        };

        Ok(invoke_isolated(hook_name, &callback.owner, callback.func.as_ref(), args).ok())
    }
}
