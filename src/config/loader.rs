//! Configuration loading and merging logic
//!
//! Handles loading configuration from multiple sources and merging them
//! according to precedence rules.

use super::{defaults, paths, schema::Config};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with all layers merged
    ///
    /// Precedence order (highest to lowest):
    /// 1. Environment variable overrides
    /// 2. Environment-specific config
    /// 3. Root config
    /// 4. Built-in defaults
    ///
    /// When `environment` is `None`, the environment named by the root config
    /// (or `SVCVIEW_ENVIRONMENT`) selects the environment-specific file.
    pub fn load(environment: Option<u64>) -> Result<Config> {
        Self::load_from(&paths::root_config_path(), environment)
    }

    /// Load configuration using an explicit root config file
    pub fn load_from(root_path: &Path, environment: Option<u64>) -> Result<Config> {
        let mut merged = serde_yaml::to_value(Self::load_defaults())
            .context("Failed to serialize default configuration")?;

        if root_path.exists() {
            merge_values(&mut merged, Self::read_value(root_path)?);
        }

        let environment = match environment {
            Some(env) => Some(env),
            None => env_override::<u64>("SVCVIEW_ENVIRONMENT")
                .or_else(|| merged.get("environment").and_then(serde_yaml::Value::as_u64)),
        };

        if let Some(env) = environment {
            let env_path = paths::environment_config_path(env);
            if env_path.exists() {
                merge_values(&mut merged, Self::read_value(&env_path)?);
            }
        }

        let mut config: Config =
            serde_yaml::from_value(merged).context("Failed to parse merged configuration")?;
        if let Some(env) = environment {
            config.environment = env;
        }

        Ok(Self::apply_env_overrides(config))
    }

    fn read_value(path: &Path) -> Result<serde_yaml::Value> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let value: serde_yaml::Value = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        // An empty file parses as null
        Ok(if value.is_null() {
            serde_yaml::Value::Mapping(Default::default())
        } else {
            value
        })
    }

    /// Load configuration from a single file
    pub fn load_file(path: &PathBuf) -> Result<Config> {
        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found: {}", path.display()));
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration by loading and checking for errors
    ///
    /// This performs strict validation - it will fail on:
    /// - Invalid YAML syntax
    /// - Invalid value types
    /// - File read errors
    /// - A table refresh rate the settings menu does not offer
    /// - An http backend without a URL
    pub fn validate(environment: Option<u64>) -> Result<Config> {
        let config = Self::load(environment).context("Failed to load merged configuration")?;

        crate::table::settings::validate_refresh_rate(config.table.auto_refresh_rate)
            .context("Invalid table.autoRefreshRate")?;
        crate::table::settings::validate_page_size(config.table.page_size)
            .context("Invalid table.pageSize")?;

        if config.backend.kind == super::schema::BackendKind::Http && config.backend.url.is_none()
        {
            return Err(anyhow::anyhow!("backend.url is required for the http backend"));
        }

        if config.max_concurrent_fetches == Some(0) {
            return Err(anyhow::anyhow!("maxConcurrentFetches must be greater than 0"));
        }

        Ok(config)
    }

    /// Load default configuration
    pub fn load_defaults() -> Config {
        defaults::default_config()
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(mut config: Config) -> Config {
        // SVCVIEW_BACKEND override
        if let Some(kind) = env_override("SVCVIEW_BACKEND") {
            config.backend.kind = kind;
        }

        // SVCVIEW_URL override
        if let Ok(url) = std::env::var("SVCVIEW_URL") {
            config.backend.url = Some(url);
        }

        // SVCVIEW_API_KEY_ENV override
        if let Ok(var) = std::env::var("SVCVIEW_API_KEY_ENV") {
            config.backend.api_key_env = Some(var);
        }

        config
    }

    /// Save configuration to a file
    pub fn save(config: &Config, path: &PathBuf) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }

        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Set one dot-separated key in the config file at `path`
    ///
    /// Only the file's own layer is rewritten. Keys it does not contain stay
    /// absent, so defaults, other layers and environment overrides never
    /// leak into it. A file that fails to parse is left untouched.
    pub fn set_in_file(path: &Path, key: &str, value: &str) -> Result<()> {
        let mut layer = if path.exists() {
            Self::read_value(path)?
        } else {
            serde_yaml::Value::Mapping(Default::default())
        };

        // Type-check the change against the full schema
        let mut merged = serde_yaml::to_value(Self::load_defaults())
            .context("Failed to serialize default configuration")?;
        merge_values(&mut merged, layer.clone());
        let mut config: Config = serde_yaml::from_value(merged)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        super::set_config_value(&mut config, key, value)?;

        let updated =
            serde_yaml::to_value(&config).context("Failed to serialize configuration")?;
        let segments: Vec<&str> = key.split('.').collect();
        let new_value = segments
            .iter()
            .try_fold(&updated, |current, segment| current.get(*segment))
            .cloned();
        set_path(&mut layer, &segments, new_value);

        if let Some(parent) = path.parent() {
            paths::ensure_dir(parent)?;
        }
        let yaml =
            serde_yaml::to_string(&layer).context("Failed to serialize configuration to YAML")?;
        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }
}

fn env_override<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Set (or remove, for `None`) the value at `path`, creating mappings on the way
fn set_path(root: &mut serde_yaml::Value, path: &[&str], value: Option<serde_yaml::Value>) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut current = root;
    for segment in parents {
        if !current.is_mapping() {
            *current = serde_yaml::Value::Mapping(Default::default());
        }
        let serde_yaml::Value::Mapping(map) = current else {
            return;
        };
        current = map
            .entry(serde_yaml::Value::from(*segment))
            .or_insert_with(|| serde_yaml::Value::Mapping(Default::default()));
    }

    if !current.is_mapping() {
        *current = serde_yaml::Value::Mapping(Default::default());
    }
    if let serde_yaml::Value::Mapping(map) = current {
        match value {
            Some(value) => {
                map.insert(serde_yaml::Value::from(*last), value);
            }
            None => {
                map.remove(*last);
            }
        }
    }
}

/// Deep-merge `overlay` into `base`; mappings merge per key, everything else replaces
fn merge_values(base: &mut serde_yaml::Value, overlay: serde_yaml::Value) {
    match (base, overlay) {
        (serde_yaml::Value::Mapping(base), serde_yaml::Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
