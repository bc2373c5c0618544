mod demo;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use extkit_config::{config_dir, config_file_path, load_and_prepare, to_yaml};
use extkit_hooks::{version_check, SemVer};

#[derive(Parser)]
#[command(name = "extkit")]
#[command(about = "extkit — versioned hook and plugin registry")]
#[command(version)]
struct Cli {
    /// Config file (default: $EXTKIT_CONFIG_DIR/config.yaml or ~/.extkit/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a callback written against CONSUMER runs on a namespace declared at PROVIDER
    Check {
        /// API version the hook or plugin type declares
        provider: String,
        /// API version the callback was written against
        consumer: String,
    },
    /// Load sample extensions in an awkward order and exercise every dispatch protocol
    Demo,
    /// Print the effective configuration as YAML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let config = load_and_prepare(&path)?;

    extkit_logging::init_logger(&config.logging).context("Failed to initialise logging")?;

    match cli.command {
        Commands::Check { provider, consumer } => {
            let compatible = version_check(&provider, &consumer)?;
            let (p, c): (SemVer, SemVer) = (provider.parse()?, consumer.parse()?);
            if compatible {
                println!("compatible: {c} callbacks run on a {p} namespace");
            } else {
                println!("incompatible: {c} callbacks are disabled on a {p} namespace");
            }
        }
        Commands::Demo => {
            info!(policy = ?config.registry.duplicate_extension, "Running demo host");
            let report = demo::run(config.registry.duplicate_extension)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Config => {
            print!("{}", to_yaml(&config)?);
        }
    }

    Ok(())
}
