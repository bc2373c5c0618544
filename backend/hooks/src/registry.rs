/// Extension registry — namespaces, API version gating, and registration.
///
/// Hooks hold an ordered list of callbacks; plugin types hold one callback
/// per plugin name. Registration may happen before the namespace is
/// declared: such callbacks start enabled and are re-checked when the
/// declaration arrives. Dispatch lives in `dispatch.rs`.
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use extkit_core::{CallbackState, DuplicatePolicy, ExtError, SemVer};

use crate::manifest::{ExtensionData, ExtensionRecord};
use crate::types::{
    CallbackInfo, Declaration, FRONT_PRIORITY, HookFn, HookSpec, PluginSpec, StateTransition,
};

// ---------------------------------------------------------------------------
// Internal tables
// ---------------------------------------------------------------------------

pub(crate) struct RegisteredCallback {
    pub(crate) owner: String,
    pub(crate) func: Arc<dyn HookFn>,
    pub(crate) api: SemVer,
    pub(crate) priority: i32,
    pub(crate) state: CallbackState,
}

impl RegisteredCallback {
    fn info(&self) -> CallbackInfo {
        CallbackInfo {
            owner: self.owner.clone(),
            api: self.api,
            priority: self.priority,
            state: self.state,
        }
    }
}

#[derive(Default)]
pub(crate) struct HookNamespace {
    pub(crate) declared_api: Option<SemVer>,
    pub(crate) callbacks: Vec<RegisteredCallback>,
}

impl HookNamespace {
    pub(crate) fn enabled(&self) -> impl Iterator<Item = &RegisteredCallback> {
        self.callbacks.iter().filter(|cb| cb.state.is_enabled())
    }
}

#[derive(Default)]
pub(crate) struct PluginNamespace {
    pub(crate) declared_api: Option<SemVer>,
    pub(crate) entries: HashMap<String, RegisteredCallback>,
}

#[derive(Debug, Clone, Copy)]
enum NamespaceKind {
    Hook,
    Plugin,
}

impl NamespaceKind {
    fn label(self, name: &str) -> String {
        match self {
            Self::Hook => format!("hook \"{name}\""),
            Self::Plugin => format!("plugin type \"{name}\""),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Owned registry of hooks, plugins, and extension metadata.
///
/// Registration takes `&mut self`, dispatch takes `&self`. Nothing is ever
/// removed; tables grow until the registry is dropped.
#[derive(Default)]
pub struct ExtensionRegistry {
    pub(crate) hooks: HashMap<String, HookNamespace>,
    pub(crate) plugins: HashMap<String, PluginNamespace>,
    extensions: Vec<ExtensionRecord>,
    duplicate_policy: DuplicatePolicy,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(duplicate_policy: DuplicatePolicy) -> Self {
        Self { duplicate_policy, ..Self::default() }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    // -- Declaration --------------------------------------------------------

    /// Declare the API version a hook provides.
    ///
    /// Redeclaring with a different version logs a warning, keeps the new
    /// version, and re-checks every callback already registered under the hook.
    pub fn declare_hook(&mut self, hook_name: &str, api_version: &str) -> Result<Declaration, ExtError> {
        let api = SemVer::parse(api_version)?;
        let namespace = self.hooks.entry(hook_name.to_string()).or_default();
        Ok(apply_declaration(
            NamespaceKind::Hook,
            hook_name,
            &mut namespace.declared_api,
            api,
            namespace.callbacks.iter_mut(),
        ))
    }

    /// Declare the API version a plugin type provides. Same rules as
    /// [`declare_hook`](Self::declare_hook).
    pub fn declare_plugin(&mut self, hook_name: &str, api_version: &str) -> Result<Declaration, ExtError> {
        let api = SemVer::parse(api_version)?;
        let namespace = self.plugins.entry(hook_name.to_string()).or_default();
        Ok(apply_declaration(
            NamespaceKind::Plugin,
            hook_name,
            &mut namespace.declared_api,
            api,
            namespace.entries.values_mut(),
        ))
    }

    // -- Registration -------------------------------------------------------

    /// Attach a callback to a hook.
    ///
    /// Ordering is two-tier only: `priority == -1` goes to the front of the
    /// list, anything else is appended. There is no general priority sort.
    pub fn register(&mut self, hook_name: &str, owner: &str, spec: HookSpec) -> Result<CallbackState, ExtError> {
        let api = SemVer::parse(&spec.api)?;
        Ok(self.insert_hook(hook_name, owner, api, spec))
    }

    /// Put a callback into the `(hook_name, plugin_name)` slot, replacing
    /// whatever was there.
    pub fn register_plugin(
        &mut self,
        hook_name: &str,
        owner: &str,
        spec: PluginSpec,
        plugin_name: &str,
    ) -> Result<CallbackState, ExtError> {
        let api = SemVer::parse(&spec.api)?;
        Ok(self.insert_plugin(hook_name, owner, api, spec, plugin_name))
    }

    /// Admit an extension: record its metadata and register all of its hook
    /// and plugin callbacks.
    ///
    /// All versions are parsed before anything is stored, so a malformed
    /// version rejects the whole extension. A duplicate name is handled per
    /// the registry's [`DuplicatePolicy`].
    pub fn add_extension(&mut self, ext: ExtensionData) -> Result<(), ExtError> {
        ext.validate()?;

        let mut hooks = Vec::with_capacity(ext.hooks.len());
        for (hook_name, spec) in &ext.hooks {
            hooks.push((hook_name.clone(), SemVer::parse(&spec.api)?, spec.clone()));
        }
        let mut plugins = Vec::new();
        for (hook_name, slots) in &ext.plugins {
            for (plugin_name, spec) in slots {
                plugins.push((
                    hook_name.clone(),
                    plugin_name.clone(),
                    SemVer::parse(&spec.api)?,
                    spec.clone(),
                ));
            }
        }

        let duplicate = self.extension(&ext.name).is_some();
        if duplicate {
            let err = ExtError::DuplicateExtensionName(ext.name.clone());
            match self.duplicate_policy {
                DuplicatePolicy::Reject => {
                    warn!(extension = %ext.name, "{err}; rejecting extension");
                    return Err(err);
                }
                DuplicatePolicy::MetadataOnly => {
                    warn!(extension = %ext.name, "{err}; keeping existing metadata, registering callbacks");
                }
            }
        } else {
            self.extensions.push(ext.record());
        }

        for (hook_name, api, spec) in hooks {
            self.insert_hook(&hook_name, &ext.name, api, spec);
        }
        for (hook_name, plugin_name, api, spec) in plugins {
            self.insert_plugin(&hook_name, &ext.name, api, spec, &plugin_name);
        }

        info!(
            extension = %ext.name,
            version = %ext.version,
            hooks = ext.hooks.len(),
            plugin_types = ext.plugins.len(),
            "Extension added"
        );
        Ok(())
    }

    fn insert_hook(&mut self, hook_name: &str, owner: &str, api: SemVer, spec: HookSpec) -> CallbackState {
        let namespace = self.hooks.entry(hook_name.to_string()).or_default();
        let state = CallbackState::compute(namespace.declared_api.as_ref(), &api);
        let callback = RegisteredCallback {
            owner: owner.to_string(),
            func: spec.func,
            api,
            priority: spec.priority,
            state,
        };

        if spec.priority == FRONT_PRIORITY {
            namespace.callbacks.insert(0, callback);
        } else {
            namespace.callbacks.push(callback);
        }

        debug!(hook = %hook_name, owner = %owner, api = %api, state = %state, "Hook callback registered");
        state
    }

    fn insert_plugin(
        &mut self,
        hook_name: &str,
        owner: &str,
        api: SemVer,
        spec: PluginSpec,
        plugin_name: &str,
    ) -> CallbackState {
        let namespace = self.plugins.entry(hook_name.to_string()).or_default();
        let state = CallbackState::compute(namespace.declared_api.as_ref(), &api);
        let callback = RegisteredCallback {
            owner: owner.to_string(),
            func: spec.func,
            api,
            priority: 0,
            state,
        };

        if let Some(previous) = namespace.entries.insert(plugin_name.to_string(), callback) {
            debug!(
                hook = %hook_name,
                plugin = %plugin_name,
                replaced_owner = %previous.owner,
                "Plugin slot overwritten"
            );
        }
        debug!(hook = %hook_name, plugin = %plugin_name, owner = %owner, api = %api, state = %state, "Plugin registered");
        state
    }

    // -- Introspection ------------------------------------------------------

    /// Metadata of every admitted extension, in admission order.
    pub fn list_extensions(&self) -> &[ExtensionRecord] {
        &self.extensions
    }

    pub fn extension(&self, name: &str) -> Option<&ExtensionRecord> {
        self.extensions.iter().find(|record| record.name == name)
    }

    pub fn hook_api(&self, hook_name: &str) -> Option<SemVer> {
        self.hooks.get(hook_name).and_then(|ns| ns.declared_api)
    }

    pub fn plugin_api(&self, hook_name: &str) -> Option<SemVer> {
        self.plugins.get(hook_name).and_then(|ns| ns.declared_api)
    }

    /// Callbacks under a hook in dispatch order, disabled ones included.
    pub fn hook_callbacks(&self, hook_name: &str) -> Vec<CallbackInfo> {
        self.hooks
            .get(hook_name)
            .map(|ns| ns.callbacks.iter().map(RegisteredCallback::info).collect())
            .unwrap_or_default()
    }

    pub fn plugin_info(&self, hook_name: &str, plugin_name: &str) -> Option<CallbackInfo> {
        self.plugins
            .get(hook_name)
            .and_then(|ns| ns.entries.get(plugin_name))
            .map(RegisteredCallback::info)
    }

    /// Plugin names registered under a plugin type, sorted.
    pub fn plugin_names(&self, hook_name: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .plugins
            .get(hook_name)
            .map(|ns| ns.entries.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// Store `api` as the namespace's declared version and recompute every
/// callback's state against it.
fn apply_declaration<'a>(
    kind: NamespaceKind,
    name: &str,
    declared: &mut Option<SemVer>,
    api: SemVer,
    callbacks: impl Iterator<Item = &'a mut RegisteredCallback>,
) -> Declaration {
    let previous = declared.replace(api);

    match previous {
        Some(prev) if prev != api => {
            let warning = ExtError::VersionMismatchOnRedeclare {
                namespace: kind.label(name),
                previous: prev.to_string(),
                attempted: api.to_string(),
            };
            warn!("{warning}");
        }
        Some(_) => debug!(namespace = %kind.label(name), api = %api, "Namespace redeclared"),
        None => info!(namespace = %kind.label(name), api = %api, "Namespace declared"),
    }

    let mut transitions = Vec::new();
    for callback in callbacks {
        let next = CallbackState::compute(Some(&api), &callback.api);
        if next != callback.state {
            debug!(
                namespace = %kind.label(name),
                owner = %callback.owner,
                from = %callback.state,
                to = %next,
                "Callback state changed"
            );
            transitions.push(StateTransition {
                owner: callback.owner.clone(),
                from: callback.state,
                to: next,
            });
            callback.state = next;
        }
    }

    Declaration { namespace: name.to_string(), api, previous, transitions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn noop(v: Value) -> anyhow::Result<Value> {
        Ok(v)
    }

    fn owners(registry: &ExtensionRegistry, hook: &str) -> Vec<String> {
        registry.hook_callbacks(hook).into_iter().map(|info| info.owner).collect()
    }

    #[test]
    fn register_before_declare_is_enabled_then_flips() {
        let mut registry = ExtensionRegistry::new();
        let state = registry.register("render", "future-ext", HookSpec::new("1.3.0", noop)).unwrap();
        assert_eq!(state, CallbackState::Enabled);

        let decl = registry.declare_hook("render", "1.2.0").unwrap();
        assert_eq!(decl.previous, None);
        assert_eq!(
            decl.transitions,
            vec![StateTransition {
                owner: "future-ext".into(),
                from: CallbackState::Enabled,
                to: CallbackState::DisabledApi,
            }]
        );
        assert_eq!(registry.hook_callbacks("render")[0].state, CallbackState::DisabledApi);
        assert_eq!(registry.hook_api("render"), Some(SemVer::new(1, 2, 0)));
    }

    #[test]
    fn register_after_declare_checks_immediately() {
        let mut registry = ExtensionRegistry::new();
        registry.declare_hook("render", "v2.1.0").unwrap();
        assert_eq!(
            registry.register("render", "old", HookSpec::new("1.0.0", noop)).unwrap(),
            CallbackState::DisabledApi
        );
        assert_eq!(
            registry.register("render", "ok", HookSpec::new("2.0.4", noop)).unwrap(),
            CallbackState::Enabled
        );
    }

    #[test]
    fn redeclare_recomputes_both_directions() {
        let mut registry = ExtensionRegistry::new();
        registry.declare_hook("render", "1.5.0").unwrap();
        registry.register("render", "a", HookSpec::new("1.4.0", noop)).unwrap();
        registry.register("render", "b", HookSpec::new("1.6.0", noop)).unwrap();

        let decl = registry.declare_hook("render", "1.3.0").unwrap();
        assert!(decl.is_mismatch());
        assert_eq!(decl.previous, Some(SemVer::new(1, 5, 0)));
        let states: Vec<_> = registry.hook_callbacks("render").iter().map(|i| i.state).collect();
        assert_eq!(states, vec![CallbackState::DisabledApi, CallbackState::DisabledApi]);

        registry.declare_hook("render", "1.6.0").unwrap();
        let states: Vec<_> = registry.hook_callbacks("render").iter().map(|i| i.state).collect();
        assert_eq!(states, vec![CallbackState::Enabled, CallbackState::Enabled]);
        assert_eq!(registry.hook_api("render"), Some(SemVer::new(1, 6, 0)));
    }

    #[test]
    fn same_version_redeclare_is_not_a_mismatch() {
        let mut registry = ExtensionRegistry::new();
        registry.declare_hook("render", "1.0.0").unwrap();
        let decl = registry.declare_hook("render", "v1.0.0").unwrap();
        assert!(!decl.is_mismatch());
        assert!(decl.transitions.is_empty());
    }

    #[test]
    fn malformed_versions_fail_fast() {
        let mut registry = ExtensionRegistry::new();
        assert!(matches!(
            registry.declare_hook("render", "1.x"),
            Err(ExtError::MalformedVersion(_))
        ));
        assert_eq!(registry.hook_api("render"), None);

        assert!(registry.register("render", "bad", HookSpec::new("latest", noop)).is_err());
        assert!(registry.hook_callbacks("render").is_empty());

        assert!(matches!(
            registry.declare_plugin("tag", "one.two.three"),
            Err(ExtError::MalformedVersion(_))
        ));
        assert_eq!(registry.plugin_api("tag"), None);

        assert!(matches!(
            registry.register_plugin("tag", "bad", PluginSpec::new("v1", |v| Ok(v)), "h1"),
            Err(ExtError::MalformedVersion(_))
        ));
        assert_eq!(registry.plugin_info("tag", "h1"), None);
    }

    #[test]
    fn policy_is_reported() {
        assert_eq!(ExtensionRegistry::new().duplicate_policy(), DuplicatePolicy::Reject);
        let registry = ExtensionRegistry::with_policy(DuplicatePolicy::MetadataOnly);
        assert_eq!(registry.duplicate_policy(), DuplicatePolicy::MetadataOnly);
    }

    #[test]
    fn front_priority_prepends_everything_else_appends() {
        let mut registry = ExtensionRegistry::new();
        registry.register("render", "a", HookSpec::new("1.0.0", noop)).unwrap();
        registry.register("render", "b", HookSpec::new("1.0.0", noop).with_priority(10)).unwrap();
        registry.register("render", "first", HookSpec::new("1.0.0", noop).first()).unwrap();
        registry.register("render", "c", HookSpec::new("1.0.0", noop)).unwrap();
        registry.register("render", "firster", HookSpec::new("1.0.0", noop).first()).unwrap();

        assert_eq!(owners(&registry, "render"), vec!["firster", "first", "a", "b", "c"]);
    }

    #[test]
    fn plugin_slots_overwrite_and_use_plugin_api() {
        let mut registry = ExtensionRegistry::new();
        registry.declare_hook("tag", "9.0.0").unwrap();
        registry.declare_plugin("tag", "1.1.0").unwrap();

        let state = registry
            .register_plugin("tag", "one", PluginSpec::new("1.0.0", noop), "h1")
            .unwrap();
        assert_eq!(state, CallbackState::Enabled);

        registry
            .register_plugin("tag", "two", PluginSpec::new("1.2.0", noop), "h1")
            .unwrap();
        let info = registry.plugin_info("tag", "h1").unwrap();
        assert_eq!(info.owner, "two");
        assert_eq!(info.state, CallbackState::DisabledApi);
        assert_eq!(registry.plugin_names("tag"), vec!["h1"]);
    }

    #[test]
    fn declare_plugin_recomputes_slots() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register_plugin("tag", "ext", PluginSpec::new("2.0.0", noop), "h2")
            .unwrap();
        let decl = registry.declare_plugin("tag", "1.0.0").unwrap();
        assert_eq!(decl.transitions.len(), 1);
        assert_eq!(registry.plugin_info("tag", "h2").unwrap().state, CallbackState::DisabledApi);
        assert_eq!(registry.plugin_api("tag"), Some(SemVer::new(1, 0, 0)));
    }

    #[test]
    fn add_extension_registers_everything() {
        let mut registry = ExtensionRegistry::new();
        let ext = ExtensionData::new("markdown")
            .with_author("wiki")
            .with_version("1.0.0")
            .with_description("markdown rendering")
            .with_hook("render", HookSpec::new("1.0.0", noop))
            .with_plugin("tag", "h1", PluginSpec::new("1.0.0", noop))
            .with_plugin("tag", "h2", PluginSpec::new("1.0.0", noop));
        registry.add_extension(ext).unwrap();

        assert_eq!(registry.list_extensions().len(), 1);
        assert_eq!(registry.list_extensions()[0].description, "markdown rendering");
        assert_eq!(owners(&registry, "render"), vec!["markdown"]);
        assert_eq!(registry.plugin_names("tag"), vec!["h1", "h2"]);
        assert_eq!(registry.plugin_info("tag", "h1").unwrap().owner, "markdown");
    }

    #[test]
    fn duplicate_extension_rejected_whole_by_default() {
        let mut registry = ExtensionRegistry::new();
        registry
            .add_extension(ExtensionData::new("dup").with_hook("render", HookSpec::new("1.0.0", noop)))
            .unwrap();
        let err = registry
            .add_extension(ExtensionData::new("dup").with_hook("save", HookSpec::new("1.0.0", noop)))
            .unwrap_err();

        assert!(matches!(err, ExtError::DuplicateExtensionName(ref n) if n == "dup"));
        assert_eq!(registry.list_extensions().len(), 1);
        assert!(registry.hook_callbacks("save").is_empty());
    }

    #[test]
    fn duplicate_extension_metadata_only_policy() {
        let mut registry = ExtensionRegistry::with_policy(DuplicatePolicy::MetadataOnly);
        registry
            .add_extension(ExtensionData::new("dup").with_version("1.0.0"))
            .unwrap();
        registry
            .add_extension(
                ExtensionData::new("dup")
                    .with_version("2.0.0")
                    .with_hook("save", HookSpec::new("1.0.0", noop)),
            )
            .unwrap();

        assert_eq!(registry.list_extensions().len(), 1);
        assert_eq!(registry.extension("dup").unwrap().version, "1.0.0");
        assert_eq!(owners(&registry, "save"), vec!["dup"]);
    }

    #[test]
    fn malformed_version_rejects_whole_extension() {
        let mut registry = ExtensionRegistry::new();
        let ext = ExtensionData::new("half")
            .with_hook("render", HookSpec::new("1.0.0", noop))
            .with_plugin("tag", "h1", PluginSpec::new("one.oh", noop));

        assert!(matches!(registry.add_extension(ext), Err(ExtError::MalformedVersion(_))));
        assert!(registry.list_extensions().is_empty());
        assert!(registry.hook_callbacks("render").is_empty());
        assert!(registry.plugin_info("tag", "h1").is_none());
    }
}
