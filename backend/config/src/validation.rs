//! Config validation with field paths.

use thiserror::Error;

use crate::schema::ExtkitConfig;

/// Level names accepted without a `target=` prefix.
const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// A config validation problem with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// Problems found in one validation pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: &str, message: impl Into<String>) {
        self.errors.push(ConfigValidationError { path: path.to_string(), message: message.into() });
    }

    fn warn(&mut self, path: &str, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError { path: path.to_string(), message: message.into() });
    }
}

pub fn validate(config: &ExtkitConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    let logging = &config.logging;

    let level = logging.level.trim();
    if level.is_empty() {
        report.error("logging.level", "must not be empty");
    } else {
        for directive in level.split(',') {
            let lvl = directive.rsplit('=').next().unwrap_or(directive).trim();
            if !LEVELS.contains(&lvl.to_ascii_lowercase().as_str()) {
                report.warn("logging.level", format!("unrecognised level in directive '{directive}'"));
            }
        }
    }

    if logging.dir.is_some() && logging.file_prefix.trim().is_empty() {
        report.error("logging.filePrefix", "must be set when logging.dir is set");
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_are_valid() {
        let report = validate(&ExtkitConfig::default());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn target_directives_are_accepted() {
        let mut config = ExtkitConfig::default();
        config.logging.level = "extkit_hooks=debug,warn".into();
        let report = validate(&config);
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn flags_bad_values() {
        let mut config = ExtkitConfig::default();
        config.logging.level = "loud".into();
        config.logging.dir = Some(PathBuf::from("/tmp"));
        config.logging.file_prefix = String::new();

        let report = validate(&config);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "logging.filePrefix");
        assert_eq!(report.warnings.len(), 1);
    }
}
