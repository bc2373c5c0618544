//! extkit configuration schema.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use extkit_core::DuplicatePolicy;

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtkitConfig {
    pub logging: LoggingConfig,
    pub registry: RegistryConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `extkit_hooks=debug,warn`.
    /// `RUST_LOG` takes precedence at runtime.
    pub level: String,
    /// Directory for daily-rotated JSON logs. Console only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// File name prefix inside `dir`.
    pub file_prefix: String,
    /// Emit JSON on the console as well.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
            file_prefix: "extkit.log".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    /// What `add_extension` does with an already-registered extension name.
    pub duplicate_extension: DuplicatePolicy,
}
