//! Structured Logger
//!
//! Wraps `tracing` with environment-based level control, a console layer,
//! and an optional rolling JSON file layer.

use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use extkit_config::LoggingConfig;

/// `RUST_LOG` when set, otherwise the configured level.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Initialize the global structured logger.
///
/// Returns `Ok(false)` if a global subscriber was already installed, and an
/// error if the log directory cannot be created.
pub fn init_logger(config: &LoggingConfig) -> Result<bool, InitError> {
    let console_plain = (!config.json).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(true)
    });
    let console_json = config
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));

    // Rolling file appender: writes NDJSON to `<dir>/<prefix>.YYYY-MM-DD`
    let file_layer = config
        .dir
        .as_ref()
        .map(|dir| {
            RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(config.file_prefix.as_str())
                .build(dir)
        })
        .transpose()?
        .map(|appender| fmt::layer().json().with_writer(appender).with_ansi(false));

    let installed = tracing_subscriber::registry()
        .with(build_filter(&config.level))
        .with(console_plain)
        .with(console_json)
        .with(file_layer)
        .try_init()
        .is_ok();
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            dir: Some(dir.path().to_path_buf()),
            ..LoggingConfig::default()
        };
        let first = init_logger(&config).unwrap();
        let second = init_logger(&config).unwrap();
        assert!(first);
        assert!(!second);
        tracing::info!("logger test line");
    }
}
