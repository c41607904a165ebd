//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use crate::table::TableSettings;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Environment used when none is given on the command line
    #[serde(default = "default_environment")]
    pub environment: u64,

    /// Ask the backend to resolve applications behind each service
    #[serde(default = "default_true")]
    pub lookup_applications: bool,

    /// Cap on concurrent namespace fetches (unbounded when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent_fetches: Option<usize>,

    /// Query cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Default table settings, used until a table saves its own
    #[serde(default)]
    pub table: TableSettings,

    /// Extra namespaces treated as system namespaces
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub system_namespaces: Vec<String>,
}

/// Which backend serves the data
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Management console REST API
    Http,
    /// Kubernetes API server from the current kubeconfig
    #[default]
    Kube,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Http => "http",
            BackendKind::Kube => "kube",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http" => Ok(BackendKind::Http),
            "kube" => Ok(BackendKind::Kube),
            _ => Err(anyhow::anyhow!(
                "Unknown backend kind '{}', expected 'http' or 'kube'",
                s
            )),
        }
    }
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Console base URL (http backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Environment variable holding the API key (http backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Skip TLS certificate verification (http backend)
    #[serde(default = "default_false")]
    pub accept_invalid_certs: bool,
}

/// Query cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Seconds a listing is served from the cache before it is refetched
    #[serde(default)]
    pub stale_seconds: u64,
}

// Default value functions
fn default_environment() -> u64 {
    1
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            environment: default_environment(),
            lookup_applications: default_true(),
            max_concurrent_fetches: None,
            cache: CacheConfig::default(),
            table: TableSettings::default(),
            system_namespaces: Vec::new(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            url: None,
            api_key_env: None,
            timeout_seconds: default_timeout_seconds(),
            accept_invalid_certs: default_false(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.backend.kind, BackendKind::Kube);
        assert_eq!(config.environment, 1);
        assert!(config.lookup_applications);
        assert_eq!(config.backend.timeout_seconds, 30);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.contains("lookupApplications"));
        assert!(yaml.contains("timeoutSeconds"));
        assert!(!yaml.contains("systemNamespaces"));
    }

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
backend:
  kind: http
  url: https://console.example.com
  apiKeyEnv: CONSOLE_API_KEY
environment: 3
table:
  autoRefreshRate: 30
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Http);
        assert_eq!(config.backend.url.as_deref(), Some("https://console.example.com"));
        assert_eq!(config.environment, 3);
        assert_eq!(config.table.auto_refresh_rate, 30);
        assert_eq!(config.table.page_size, 10);
    }
}
