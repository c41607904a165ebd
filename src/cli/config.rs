//! Configuration subcommand handlers

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::config::{paths, ConfigLoader};

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigSubcommand {
    /// Get configuration value
    Get {
        /// Configuration key (e.g., "backend.url", "table.pageSize")
        key: Option<String>,
    },
    /// Set configuration value
    Set {
        /// Configuration key (e.g., "backend.url", "table.pageSize")
        key: String,
        /// Configuration value
        value: String,
        /// Save into the environment-specific config instead of the root config
        #[arg(long)]
        env: Option<u64>,
    },
    /// List all configuration
    List,
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
}

/// Handle configuration subcommands
pub async fn handle_config_command(cmd: ConfigSubcommand) -> Result<()> {
    match cmd {
        ConfigSubcommand::Get { key } => {
            let config = ConfigLoader::load(None).context("Failed to load configuration")?;

            if let Some(key) = key {
                let value = crate::config::get_config_value(&config, &key)?;
                println!("{}", value);
            } else {
                let yaml =
                    serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
                print!("{}", yaml);
            }
        }
        ConfigSubcommand::Set { key, value, env } => {
            let path = match env {
                Some(env) => paths::environment_config_path(env),
                None => paths::root_config_path(),
            };

            ConfigLoader::set_in_file(&path, &key, &value)
                .with_context(|| format!("Failed to set {} = {}", key, value))?;

            match env {
                Some(env) => println!("Configuration saved for environment: {}", env),
                None => println!("Configuration saved"),
            }
        }
        ConfigSubcommand::List => {
            let config = ConfigLoader::load(None).context("Failed to load configuration")?;
            let yaml =
                serde_yaml::to_string(&config).context("Failed to serialize configuration")?;
            print!("{}", yaml);
        }
        ConfigSubcommand::Path => {
            println!("{}", paths::root_config_path().display());
        }
        ConfigSubcommand::Validate => match ConfigLoader::validate(None) {
            Ok(_) => {
                println!("Configuration is valid");
            }
            Err(e) => {
                eprintln!("Configuration is invalid: {:#}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
