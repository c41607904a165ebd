//! Table settings subcommand handlers

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::config::ConfigLoader;
use crate::table::settings::format_refresh_rate;
use crate::table::{DefaultDatatableSettings, SettingsStore, TableState, SERVICES_TABLE_KEY};

/// Table settings subcommands
#[derive(Subcommand, Debug)]
pub enum TableSubcommand {
    /// Show the persisted settings of a table
    Show {
        /// Table storage key
        #[arg(long, default_value = SERVICES_TABLE_KEY)]
        storage_key: String,
    },
    /// Change a table setting (showSystemResources, autoRefreshRate, pageSize, sortBy)
    Set {
        /// Setting name
        key: String,
        /// New value, e.g. "true", "30s", "off", "-name"
        value: String,
        /// Table storage key
        #[arg(long, default_value = SERVICES_TABLE_KEY)]
        storage_key: String,
    },
}

fn load_state(storage_key: &str) -> Result<TableState> {
    let defaults = ConfigLoader::load(None)
        .map(|config| config.table)
        .unwrap_or_default();
    TableState::load(SettingsStore::default_location(), storage_key, defaults)
        .with_context(|| format!("Failed to load table settings for {}", storage_key))
}

fn print_settings(state: &TableState) {
    let settings = state.settings();
    println!("table: {}", state.storage_key());
    println!(
        "  file: {}",
        SettingsStore::default_location()
            .path(state.storage_key())
            .display()
    );
    println!("  pageSize: {}", settings.page_size);
    match &settings.sort_by {
        Some(sort) => println!(
            "  sortBy: {} ({})",
            sort.id,
            if sort.desc { "desc" } else { "asc" }
        ),
        None => println!("  sortBy: none"),
    }
    println!(
        "  autoRefreshRate: {}",
        format_refresh_rate(settings.auto_refresh_rate)
    );
    println!("  showSystemResources: {}", settings.show_system_resources);
}

/// Handle table subcommands
pub fn handle_table_command(cmd: TableSubcommand) -> Result<()> {
    match cmd {
        TableSubcommand::Show { storage_key } => {
            let state = load_state(&storage_key)?;
            print_settings(&state);
        }
        TableSubcommand::Set {
            key,
            value,
            storage_key,
        } => {
            let mut state = load_state(&storage_key)?;
            DefaultDatatableSettings::new(&mut state)
                .apply(&key, &value)
                .with_context(|| format!("Failed to set {} = {}", key, value))?;
            print_settings(&state);
        }
    }

    Ok(())
}
