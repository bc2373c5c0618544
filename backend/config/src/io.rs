//! Config file location and loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use crate::env::resolve_env_vars;
use crate::schema::ExtkitConfig;

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Resolve the extkit config directory.
/// Priority: `EXTKIT_CONFIG_DIR` env > `~/.extkit/` > `./.extkit/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("EXTKIT_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".extkit"),
        None => PathBuf::from(".extkit"),
    }
}

/// Resolve the full path to the main config file.
pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Parse a YAML config document, resolving `${VAR}` references.
pub fn parse_config(raw: &str) -> Result<ExtkitConfig> {
    if raw.trim().is_empty() {
        return Ok(ExtkitConfig::default());
    }
    let value: Value = serde_yaml::from_str(raw).context("Failed to parse config YAML")?;
    // A comment-only document parses as null.
    let value = if value.is_null() { Value::Object(Default::default()) } else { value };
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    serde_json::from_value(value).context("Config does not match the expected schema")
}

/// Load and parse the config from disk.
///
/// Returns `Ok(Default::default())` if the file doesn't exist (first run).
pub fn load_config(path: &Path) -> Result<ExtkitConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(ExtkitConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = parse_config(&raw).with_context(|| format!("Invalid config at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Render a config as YAML.
pub fn to_yaml(config: &ExtkitConfig) -> Result<String> {
    serde_yaml::to_string(config).context("Failed to serialize config to YAML")
}

#[cfg(test)]
mod tests {
    use super::*;
    use extkit_core::DuplicatePolicy;
    use std::io::Write;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&config_file_path(dir.path())).unwrap();
        assert_eq!(config, ExtkitConfig::default());
    }

    #[test]
    fn loads_yaml_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "registry:\n  duplicateExtension: metadata-only\nlogging:\n  level: warn").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.registry.duplicate_extension, DuplicatePolicy::MetadataOnly);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(load_config(file.path()).unwrap(), ExtkitConfig::default());
    }

    #[test]
    fn schema_errors_are_reported() {
        let err = parse_config("registry:\n  duplicateExtension: sometimes\n").unwrap_err();
        assert!(format!("{err:#}").contains("schema"));
    }

    #[test]
    fn yaml_round_trips_through_to_yaml() {
        let config = ExtkitConfig::default();
        let yaml = to_yaml(&config).unwrap();
        assert!(yaml.contains("duplicateExtension: reject"));
        assert_eq!(parse_config(&yaml).unwrap(), config);
    }
}
