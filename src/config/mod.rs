//! Configuration system for svcview
//!
//! Layered YAML configuration: built-in defaults, a root config file, an
//! optional per-environment file and environment variable overrides.

mod defaults;
pub mod loader;
pub mod paths;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::{BackendConfig, BackendKind, CacheConfig, Config};

use crate::table::settings::{validate_page_size, validate_refresh_rate};

/// Get a configuration value by key (dot notation)
pub fn get_config_value(config: &schema::Config, key: &str) -> anyhow::Result<String> {
    match key {
        "backend.kind" => Ok(config.backend.kind.as_str().to_string()),
        "backend.url" => Ok(config.backend.url.clone().unwrap_or_default()),
        "backend.apiKeyEnv" => Ok(config.backend.api_key_env.clone().unwrap_or_default()),
        "backend.timeoutSeconds" => Ok(config.backend.timeout_seconds.to_string()),
        "backend.acceptInvalidCerts" => Ok(config.backend.accept_invalid_certs.to_string()),
        "environment" => Ok(config.environment.to_string()),
        "lookupApplications" => Ok(config.lookup_applications.to_string()),
        "maxConcurrentFetches" => Ok(config
            .max_concurrent_fetches
            .map(|n| n.to_string())
            .unwrap_or_default()),
        "cache.staleSeconds" => Ok(config.cache.stale_seconds.to_string()),
        "table.pageSize" => Ok(config.table.page_size.to_string()),
        "table.autoRefreshRate" => Ok(config.table.auto_refresh_rate.to_string()),
        "table.showSystemResources" => Ok(config.table.show_system_resources.to_string()),
        "systemNamespaces" => serde_yaml::to_string(&config.system_namespaces)
            .map_err(|e| anyhow::anyhow!("Failed to serialize systemNamespaces: {}", e)),
        _ => Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }
}

/// Set a configuration value by key (dot notation)
pub fn set_config_value(config: &mut schema::Config, key: &str, value: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    match key {
        "backend.kind" => {
            config.backend.kind = value.parse()?;
        }
        "backend.url" => {
            if value.is_empty() {
                config.backend.url = None;
            } else {
                url::Url::parse(value).with_context(|| format!("Invalid URL: {}", value))?;
                config.backend.url = Some(value.to_string());
            }
        }
        "backend.apiKeyEnv" => {
            config.backend.api_key_env = (!value.is_empty()).then(|| value.to_string());
        }
        "backend.timeoutSeconds" => {
            config.backend.timeout_seconds = value
                .parse()
                .context("backend.timeoutSeconds must be a number")?;
        }
        "backend.acceptInvalidCerts" => {
            config.backend.accept_invalid_certs = value
                .parse()
                .context("backend.acceptInvalidCerts must be 'true' or 'false'")?;
        }
        "environment" => {
            config.environment = value.parse().context("environment must be a number")?;
        }
        "lookupApplications" => {
            config.lookup_applications = value
                .parse()
                .context("lookupApplications must be 'true' or 'false'")?;
        }
        "maxConcurrentFetches" => {
            config.max_concurrent_fetches = if value.is_empty() {
                None
            } else {
                let n: usize = value
                    .parse()
                    .context("maxConcurrentFetches must be a number")?;
                if n == 0 {
                    return Err(anyhow::anyhow!("maxConcurrentFetches must be greater than 0"));
                }
                Some(n)
            };
        }
        "cache.staleSeconds" => {
            config.cache.stale_seconds = value
                .parse()
                .context("cache.staleSeconds must be a number")?;
        }
        "table.pageSize" => {
            let size = value.parse().context("table.pageSize must be a number")?;
            config.table.page_size = validate_page_size(size)?;
        }
        "table.autoRefreshRate" => {
            let rate = value
                .parse()
                .context("table.autoRefreshRate must be a number of seconds")?;
            config.table.auto_refresh_rate = validate_refresh_rate(rate)?;
        }
        "table.showSystemResources" => {
            config.table.show_system_resources = value
                .parse()
                .context("table.showSystemResources must be 'true' or 'false'")?;
        }
        "systemNamespaces" => {
            // Parse as YAML array or comma-separated list
            config.system_namespaces = if value.trim_start().starts_with('[') {
                serde_yaml::from_str(value)
                    .context("systemNamespaces must be a YAML array (e.g., ['monitoring', 'ingress'])")?
            } else {
                value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            };
        }
        _ => return Err(anyhow::anyhow!("Unknown configuration key: {}", key)),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_roundtrip() {
        let mut config = Config::default();
        set_config_value(&mut config, "backend.kind", "http").unwrap();
        set_config_value(&mut config, "backend.url", "https://console.example.com").unwrap();
        set_config_value(&mut config, "table.autoRefreshRate", "60").unwrap();

        assert_eq!(get_config_value(&config, "backend.kind").unwrap(), "http");
        assert_eq!(
            get_config_value(&config, "backend.url").unwrap(),
            "https://console.example.com"
        );
        assert_eq!(get_config_value(&config, "table.autoRefreshRate").unwrap(), "60");
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = Config::default();
        assert!(set_config_value(&mut config, "table.autoRefreshRate", "45").is_err());
        assert!(set_config_value(&mut config, "table.pageSize", "0").is_err());
        assert!(set_config_value(&mut config, "backend.kind", "grpc").is_err());
        assert!(set_config_value(&mut config, "backend.url", "not a url").is_err());
        assert!(set_config_value(&mut config, "maxConcurrentFetches", "0").is_err());
        assert!(set_config_value(&mut config, "nope", "1").is_err());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_set_system_namespaces() {
        let mut config = Config::default();
        set_config_value(&mut config, "systemNamespaces", "monitoring, ingress").unwrap();
        assert_eq!(config.system_namespaces, vec!["monitoring", "ingress"]);

        set_config_value(&mut config, "systemNamespaces", "['cert-manager']").unwrap();
        assert_eq!(config.system_namespaces, vec!["cert-manager"]);
    }
}
