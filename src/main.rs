//! svcview - list and manage services across all namespaces of an environment

use anyhow::Result;
use clap::{Parser, Subcommand};
use svcview::cli::{
    ConfigSubcommand, ServicesSubcommand, TableSubcommand, display_version,
    handle_config_command, handle_services_command, handle_table_command, init_logging,
};

/// svcview - list and manage services across all namespaces of an environment
#[derive(Parser, Debug)]
#[command(name = "svcview")]
#[command(about = "List and manage services across all namespaces of an environment", long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

/// Main commands
#[derive(Subcommand, Debug)]
enum Command {
    /// List and delete services
    Services {
        #[command(subcommand)]
        subcommand: ServicesSubcommand,
    },
    /// Table settings
    Table {
        #[command(subcommand)]
        subcommand: TableSubcommand,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_file = init_logging(args.debug);
    if let Some(ref log_path) = log_file {
        eprintln!(
            "Debug logging enabled. Logs written to: {}",
            log_path.display()
        );
    }

    match args.command {
        Command::Services { subcommand } => handle_services_command(subcommand).await,
        Command::Table { subcommand } => handle_table_command(subcommand),
        Command::Config { subcommand } => handle_config_command(subcommand).await,
        Command::Version => {
            display_version();
            Ok(())
        }
    }
}
