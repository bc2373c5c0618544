//! `extkit-config` — runtime configuration for extkit hosts.
//!
//! Provides:
//! - Typed config schema (logging, registry policy)
//! - YAML loading with `${ENV_VAR}` substitution
//! - `EXTKIT_*` environment overrides
//! - Validation with field paths

pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use env::{apply_env_overrides, apply_env_overrides_with, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, parse_config, to_yaml};
pub use schema::{ExtkitConfig, LoggingConfig, RegistryConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::path::Path;

use anyhow::{bail, Result};

/// Load a config file, apply env overrides, and validate it.
///
/// This is the main entry point for loading a config at runtime.
pub fn load_and_prepare(path: &Path) -> Result<ExtkitConfig> {
    let config = apply_env_overrides(load_config(path)?)?;

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if !report.is_valid() {
        bail!("{} config error(s) in {}", report.errors.len(), path.display());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn invalid_config_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  dir: /tmp/extkit-logs\n  filePrefix: ''").unwrap();
        let err = load_and_prepare(file.path()).unwrap_err();
        assert!(err.to_string().contains("config error"));
    }

    #[test]
    fn valid_config_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  json: true").unwrap();
        let config = load_and_prepare(file.path()).unwrap();
        assert!(config.logging.json);
    }
}
