/// Extension manifest — metadata plus every hook and plugin callback an
/// extension brings along. Consumed by `ExtensionRegistry::add_extension`.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use extkit_core::ExtError;

use crate::types::{HookSpec, PluginSpec};

/// Metadata kept for every admitted extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
}

/// Everything an extension hands to the registry in one call.
#[derive(Debug, Clone, Default)]
pub struct ExtensionData {
    pub name: String,
    pub author: String,
    pub version: String,
    pub description: String,
    /// Hook name → callback. One callback per hook per extension.
    pub hooks: HashMap<String, HookSpec>,
    /// Plugin type → plugin name → callback.
    pub plugins: HashMap<String, HashMap<String, PluginSpec>>,
}

impl ExtensionData {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_hook(mut self, hook_name: impl Into<String>, spec: HookSpec) -> Self {
        self.hooks.insert(hook_name.into(), spec);
        self
    }

    pub fn with_plugin(
        mut self,
        hook_name: impl Into<String>,
        plugin_name: impl Into<String>,
        spec: PluginSpec,
    ) -> Self {
        self.plugins
            .entry(hook_name.into())
            .or_default()
            .insert(plugin_name.into(), spec);
        self
    }

    /// Validate the manifest for required fields.
    pub fn validate(&self) -> Result<(), ExtError> {
        if self.name.trim().is_empty() {
            return Err(ExtError::InvalidExtension("extension name is empty".into()));
        }
        if self.hooks.keys().any(|hook| hook.is_empty()) {
            return Err(ExtError::InvalidExtension(format!(
                "extension '{}' registers a hook with an empty name",
                self.name
            )));
        }
        for (hook, plugins) in &self.plugins {
            if hook.is_empty() || plugins.keys().any(|key| key.is_empty()) {
                return Err(ExtError::InvalidExtension(format!(
                    "extension '{}' registers a plugin with an empty type or name",
                    self.name
                )));
            }
        }
        Ok(())
    }

    pub fn record(&self) -> ExtensionRecord {
        ExtensionRecord {
            name: self.name.clone(),
            author: self.author.clone(),
            version: self.version.clone(),
            description: self.description.clone(),
        }
    }
}
