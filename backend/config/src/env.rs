//! Environment handling for config values.
//!
//! - `${VAR_NAME}` in any string leaf is replaced at load time. Only
//!   uppercase `[A-Z_][A-Z0-9_]*` names are matched; `$${VAR}` stays as a
//!   literal `${VAR}`.
//! - `EXTKIT_*` variables override individual fields after parsing.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::schema::ExtkitConfig;

/// Optional escaping `$`, then the `${NAME}` reference.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

pub const ENV_LOG_LEVEL: &str = "EXTKIT_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "EXTKIT_LOG_DIR";
pub const ENV_DUPLICATE_EXTENSION: &str = "EXTKIT_DUPLICATE_EXTENSION";

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references using the process environment.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    resolve_env_vars_with(value, &std::env::vars().collect())
}

/// Substitute `${VAR}` references using a provided map (useful for testing).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    Ok(substitute_value(value, env, "")?)
}

fn substitute_value(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, MissingEnvVarError> {
    match value {
        Value::String(s) => substitute_string(s, env, path).map(Value::String),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, v) in map {
                let child = if path.is_empty() { key.clone() } else { format!("{path}.{key}") };
                out.insert(key.clone(), substitute_value(v, env, &child)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing = None;
    let replaced = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{name}}}");
        }
        match env.get(name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err),
        None => Ok(replaced.into_owned()),
    }
}

/// Apply `EXTKIT_*` overrides from the process environment.
pub fn apply_env_overrides(config: ExtkitConfig) -> Result<ExtkitConfig> {
    apply_env_overrides_with(config, &std::env::vars().collect())
}

pub fn apply_env_overrides_with(
    mut config: ExtkitConfig,
    env: &HashMap<String, String>,
) -> Result<ExtkitConfig> {
    let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());

    if let Some(level) = get(ENV_LOG_LEVEL) {
        config.logging.level = level.to_string();
    }
    if let Some(dir) = get(ENV_LOG_DIR) {
        config.logging.dir = Some(PathBuf::from(dir));
    }
    if let Some(policy) = get(ENV_DUPLICATE_EXTENSION) {
        config.registry.duplicate_extension = policy
            .parse()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("Invalid {ENV_DUPLICATE_EXTENSION}"))?;
    }
    Ok(config)
}
