//! CLI command handling module
//!
//! Handles all CLI subcommands and argument parsing.

mod config;
mod logging;
mod services;
mod table;
mod version;

pub use config::{handle_config_command, ConfigSubcommand};
pub use logging::*;
pub use services::{connect, handle_services_command, render_table, ServicesSubcommand};
pub use table::{handle_table_command, TableSubcommand};
pub use version::display_version;
