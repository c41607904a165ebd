//! Default configuration values

use super::schema::Config;

/// Get the default configuration
pub fn default_config() -> Config {
    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendKind;

    #[test]
    fn test_default_config() {
        let config = default_config();
        assert_eq!(config.backend.kind, BackendKind::Kube);
        assert_eq!(config.cache.stale_seconds, 0);
        assert!(!config.table.show_system_resources);
    }
}
