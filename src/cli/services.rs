//! Service subcommand handlers

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{Backend, DeletePayload, EnvironmentId, HttpBackend, KubeBackend, Service};
use crate::config::{BackendKind, Config, ConfigLoader};
use crate::services::{ServiceLister, ServicesApi};
use crate::table::{SettingsStore, TableState, SERVICES_TABLE_KEY};

/// Service subcommands
#[derive(Subcommand, Debug)]
pub enum ServicesSubcommand {
    /// List services across all namespaces
    List {
        /// Environment id (defaults to the configured one)
        #[arg(long)]
        env: Option<u64>,
        /// Include services of system namespaces
        #[arg(long, short = 'A')]
        all: bool,
        /// Only show services matching this text
        #[arg(long, short = 's')]
        search: Option<String>,
        /// Page to display, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
        /// Keep refreshing at the table's auto-refresh rate
        #[arg(long, short = 'w')]
        watch: bool,
        /// Report namespaces that could not be listed
        #[arg(long)]
        show_failures: bool,
    },
    /// Delete services given as namespace/name
    Delete {
        /// Services to delete, e.g. default/web
        #[arg(required = true)]
        services: Vec<String>,
        /// Environment id (defaults to the configured one)
        #[arg(long)]
        env: Option<u64>,
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Build the backend selected by the configuration
pub async fn connect(config: &Config) -> Result<Arc<dyn Backend>> {
    match config.backend.kind {
        BackendKind::Http => {
            let url = config
                .backend
                .url
                .as_deref()
                .context("backend.url is required for the http backend")?;
            let api_key = match &config.backend.api_key_env {
                Some(var) => Some(std::env::var(var).with_context(|| {
                    format!("Environment variable {} not set (required for API key)", var)
                })?),
                None => None,
            };
            let backend = HttpBackend::new(
                url,
                api_key,
                Duration::from_secs(config.backend.timeout_seconds),
                config.backend.accept_invalid_certs,
            )?;
            Ok(Arc::new(backend))
        }
        BackendKind::Kube => {
            let client = crate::kube::create_client(None).await?;
            if let Some(context) = crate::kube::current_context() {
                tracing::info!("Using kubeconfig context: {}", context);
            }
            Ok(Arc::new(KubeBackend::new(client)))
        }
    }
}

fn build_api(config: &Config, backend: Arc<dyn Backend>) -> ServicesApi {
    tracing::debug!(
        "Using {} backend for environment {}",
        backend.backend_type(),
        config.environment
    );
    let mut lister = ServiceLister::new(backend).lookup_applications(config.lookup_applications);
    if let Some(limit) = config.max_concurrent_fetches {
        lister = lister.with_concurrency(limit);
    }
    ServicesApi::new(lister, Duration::from_secs(config.cache.stale_seconds))
}

fn load_table(config: &Config, all: bool, search: Option<String>) -> Result<TableState> {
    let mut state = TableState::load(
        SettingsStore::default_location(),
        SERVICES_TABLE_KEY,
        config.table.clone(),
    )?;
    if all {
        // One-off override, not persisted
        let mut settings = state.settings().clone();
        settings.show_system_resources = true;
        state = TableState::new(SERVICES_TABLE_KEY, settings);
    }
    let mut state = state.with_system_namespaces(config.system_namespaces.clone());
    if let Some(search) = search {
        state.set_search(search);
    }
    Ok(state)
}

/// Handle service subcommands
pub async fn handle_services_command(cmd: ServicesSubcommand) -> Result<()> {
    match cmd {
        ServicesSubcommand::List {
            env,
            all,
            search,
            page,
            watch,
            show_failures,
        } => {
            let config = ConfigLoader::load(env).context("Failed to load configuration")?;
            let env = EnvironmentId(config.environment);
            let backend = connect(&config).await?;
            let api = build_api(&config, backend);
            let table = load_table(&config, all, search)?;
            let page = page.max(1) - 1;

            if watch {
                return watch_services(&api, env, &table, page).await;
            }

            if show_failures {
                let listing = api.lister().list_detailed(env).await?;
                print!("{}", render_table(&table, &listing.items, page));
                for failure in &listing.failed_namespaces {
                    eprintln!(
                        "warning: namespace '{}' could not be listed: {}",
                        failure.namespace, failure.error
                    );
                }
            } else {
                let services = api
                    .services(env)
                    .await
                    .map_err(|e| anyhow::anyhow!("{}: {}", e, error_source(&*e)))?;
                print!("{}", render_table(&table, &services, page));
            }
        }
        ServicesSubcommand::Delete { services, env, yes } => {
            let payload = DeletePayload::from_refs(&services)?;
            let config = ConfigLoader::load(env).context("Failed to load configuration")?;
            let env = EnvironmentId(config.environment);

            if !yes {
                println!("The following services would be deleted in environment {}:", env);
                for (namespace, names) in payload.iter() {
                    for name in names {
                        println!("  {}/{}", namespace, name);
                    }
                }
                println!("Re-run with --yes to delete them.");
                return Ok(());
            }

            let backend = connect(&config).await?;
            let api = build_api(&config, backend);

            delete_services(&api, env, &payload).await?;
        }
    }

    Ok(())
}

/// Delete the payload without listing the environment first
async fn delete_services(
    api: &ServicesApi,
    env: EnvironmentId,
    payload: &DeletePayload,
) -> Result<()> {
    api.delete_services(env, payload)
        .await
        .map_err(|e| anyhow::anyhow!("{}: {}", e, error_source(&e)))?;
    println!("Deleted {} service(s)", payload.len());
    Ok(())
}

fn error_source(err: &dyn std::error::Error) -> String {
    err.source().map(|s| s.to_string()).unwrap_or_default()
}

async fn watch_services(
    api: &ServicesApi,
    env: EnvironmentId,
    table: &TableState,
    page: usize,
) -> Result<()> {
    let rate = table.settings().auto_refresh_rate;
    let rate = if rate == 0 {
        tracing::info!("Auto-refresh is off for this table, refreshing every 10s");
        10
    } else {
        rate
    };

    let mut receiver = api.watch_services(env);
    let mut ticker = tokio::time::interval(Duration::from_secs(rate));
    ticker.tick().await;

    loop {
        tokio::select! {
            changed = receiver.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = receiver.borrow_and_update().clone();
                if state.is_fetching {
                    continue;
                }
                if let Some(error) = &state.error {
                    eprintln!("{}: {}", error, error_source(&**error));
                }
                if let Some(services) = &state.data {
                    // Clear screen and move the cursor home
                    print!("\x1b[2J\x1b[H");
                    print!("{}", render_table(table, services, page));
                }
            }
            _ = ticker.tick() => {
                api.refresh(env);
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    Ok(())
}

/// Render visible services as a plain text table
pub fn render_table(table: &TableState, services: &[Service], page: usize) -> String {
    let rows = table.visible(services);
    let page_count = table.page_count(rows.len()).max(1);
    let page = page.min(page_count - 1);

    let now = Utc::now();
    let header = ["NAMESPACE", "NAME", "TYPE", "CLUSTER-IP", "PORTS", "AGE", "APPLICATIONS"];
    let lines: Vec<[String; 7]> = table
        .page(&rows, page)
        .iter()
        .map(|svc| {
            [
                svc.namespace.clone(),
                svc.name.clone(),
                svc.service_type.clone(),
                svc.cluster_ip().unwrap_or("-").to_string(),
                svc.ports_summary(),
                svc.creation_timestamp
                    .as_deref()
                    .map(|ts| format_age(ts, now))
                    .unwrap_or_else(|| "-".to_string()),
                svc.applications
                    .iter()
                    .map(|a| a.name.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for line in &lines {
        for (width, cell) in widths.iter_mut().zip(line.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let format_row = |cells: &[&str]| -> String {
        cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = String::new();
    out.push_str(&format_row(&header));
    out.push('\n');
    for line in &lines {
        let cells: Vec<&str> = line.iter().map(String::as_str).collect();
        out.push_str(&format_row(&cells));
        out.push('\n');
    }
    out.push_str(&format!(
        "{} service(s), page {}/{}\n",
        rows.len(),
        page + 1,
        page_count
    ));
    out
}

/// Format an age string from an RFC3339 timestamp
fn format_age(value: &str, now: DateTime<Utc>) -> String {
    let Ok(dt) = DateTime::parse_from_rfc3339(value) else {
        return value.to_string();
    };
    let duration = now.signed_duration_since(dt.with_timezone(&Utc));

    if duration.num_seconds() < 60 {
        format!("{}s", duration.num_seconds().max(0))
    } else if duration.num_minutes() < 60 {
        format!("{}m", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h", duration.num_hours())
    } else {
        format!("{}d", duration.num_days())
    }
}
