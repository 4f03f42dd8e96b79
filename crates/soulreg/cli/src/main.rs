//! Soulreg - soulbound identity and reputation registry
//!
//! Runs registry scripts or the reference walkthrough against an in-process
//! registry service and prints one JSON line per result.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use soulreg_cli::script::{load_script, run_script};
use soulreg_cli::{demo, RegistryConfig};
use soulreg_service::RegistryService;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Soulreg CLI
#[derive(Parser)]
#[command(name = "soulreg")]
#[command(about = "Soulreg - soulbound identity and reputation registry", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SOULREG_CONFIG")]
    config: Option<String>,

    /// Network profile
    #[arg(short, long, env = "SOULREG_NETWORK")]
    network: Option<String>,

    /// Log level
    #[arg(long, env = "SOULREG_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "SOULREG_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the reference walkthrough against a fresh registry
    Demo,

    /// Execute a JSON script of registry calls
    Run {
        /// Path to the script file
        script: PathBuf,
    },

    /// Print the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = RegistryConfig::load(cli.config.as_deref())
        .context("failed to load configuration")?;

    // Override with CLI args
    if let Some(network) = cli.network {
        config.network = network;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    let profile = config.profile()?;
    info!(
        network = profile.name,
        chain_id = profile.chain_id,
        rpc = profile.rpc_url,
        "Network profile selected"
    );

    match cli.command {
        Command::Demo => {
            let report = demo::run_demo(&config).await?;
            for outcome in &report.outcomes {
                println!("{}", serde_json::to_string(outcome)?);
            }
            for event in &report.events {
                println!("{}", serde_json::to_string(event)?);
            }
        }
        Command::Run { script } => {
            let calls = load_script(&script)
                .with_context(|| format!("failed to load script {}", script.display()))?;
            let service = RegistryService::new(&config.service_config())?;
            for outcome in run_script(&service, &calls).await {
                println!("{}", serde_json::to_string(&outcome)?);
            }
        }
        Command::Config => {
            let resolved = serde_json::json!({
                "config": config,
                "profile": profile,
            });
            println!("{}", serde_json::to_string_pretty(&resolved)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn flags_read_their_environment_variables() {
        let command = Cli::command();
        command.clone().debug_assert();

        let env_of = |id: &str| {
            command
                .get_arguments()
                .find(|arg| arg.get_id() == id)
                .and_then(|arg| arg.get_env())
                .and_then(|name| name.to_str())
                .map(str::to_owned)
        };
        assert_eq!(env_of("config").as_deref(), Some("SOULREG_CONFIG"));
        assert_eq!(env_of("network").as_deref(), Some("SOULREG_NETWORK"));
        assert_eq!(env_of("log_level").as_deref(), Some("SOULREG_LOG_LEVEL"));
        assert_eq!(env_of("json").as_deref(), Some("SOULREG_LOG_JSON"));
    }
}
