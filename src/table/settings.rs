//! Table settings and the default settings menu

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Auto-refresh rates offered by the settings menu, in seconds (0 = off)
pub const AUTO_REFRESH_RATES: &[u64] = &[0, 10, 30, 60, 120, 300];

/// Column a table is sorted by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortBy {
    pub id: String,
    #[serde(default)]
    pub desc: bool,
}

impl SortBy {
    /// Parse `column` (ascending) or `-column` (descending)
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (id, desc) = match s.strip_prefix('-') {
            Some(id) => (id, true),
            None => (s, false),
        };
        (!id.is_empty()).then(|| SortBy {
            id: id.to_string(),
            desc,
        })
    }
}

/// Persisted settings of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSettings {
    /// Rows per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortBy>,

    /// Auto-refresh interval in seconds, 0 disables it
    #[serde(default)]
    pub auto_refresh_rate: u64,

    /// Show resources living in system namespaces
    #[serde(default)]
    pub show_system_resources: bool,
}

fn default_page_size() -> usize {
    10
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            sort_by: None,
            auto_refresh_rate: 0,
            show_system_resources: false,
        }
    }
}

/// Check that `rate` is one of [`AUTO_REFRESH_RATES`]
pub fn validate_refresh_rate(rate: u64) -> Result<u64> {
    if AUTO_REFRESH_RATES.contains(&rate) {
        Ok(rate)
    } else {
        anyhow::bail!(
            "Unsupported auto-refresh rate {}s, expected one of {:?}",
            rate,
            AUTO_REFRESH_RATES
        )
    }
}

pub fn validate_page_size(size: usize) -> Result<usize> {
    if size == 0 {
        anyhow::bail!("pageSize must be greater than 0");
    }
    Ok(size)
}

/// Control shown in the default datatable settings menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsControl {
    pub key: &'static str,
    pub label: &'static str,
    pub value: String,
}

/// Settings menu shared by the Kubernetes tables
///
/// Offers the system resources toggle and the auto-refresh rate.
pub struct DefaultDatatableSettings<'a> {
    state: &'a mut super::TableState,
}

impl<'a> DefaultDatatableSettings<'a> {
    pub fn new(state: &'a mut super::TableState) -> Self {
        Self { state }
    }

    pub fn controls(&self) -> Vec<SettingsControl> {
        let settings = self.state.settings();
        vec![
            SettingsControl {
                key: "showSystemResources",
                label: "Show system resources",
                value: settings.show_system_resources.to_string(),
            },
            SettingsControl {
                key: "autoRefreshRate",
                label: "Auto refresh",
                value: format_refresh_rate(settings.auto_refresh_rate),
            },
        ]
    }

    pub fn set_show_system_resources(&mut self, value: bool) -> Result<()> {
        self.state.set_show_system_resources(value)
    }

    pub fn handle_refresh_rate_change(&mut self, auto_refresh_rate: u64) -> Result<()> {
        self.state.set_auto_refresh_rate(auto_refresh_rate)
    }

    /// Apply a `key = value` change coming from the command line
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "showSystemResources" => self.set_show_system_resources(
                value
                    .parse()
                    .context("showSystemResources must be 'true' or 'false'")?,
            ),
            "autoRefreshRate" => self.handle_refresh_rate_change(
                parse_refresh_rate(value).context("autoRefreshRate must be a number of seconds")?,
            ),
            "pageSize" => self
                .state
                .set_page_size(value.parse().context("pageSize must be a number")?),
            "sortBy" => self.state.set_sort_by(SortBy::parse(value)),
            _ => Err(anyhow::anyhow!("Unknown table setting: {}", key)),
        }
    }
}

/// Parse `30`, `30s`, `off`
fn parse_refresh_rate(value: &str) -> Result<u64> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("off") {
        return Ok(0);
    }
    let value = value.strip_suffix('s').unwrap_or(value);
    Ok(value.parse()?)
}

pub fn format_refresh_rate(rate: u64) -> String {
    if rate == 0 {
        "off".to_string()
    } else {
        format!("{}s", rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_by_parse() {
        assert_eq!(
            SortBy::parse("-name"),
            Some(SortBy {
                id: "name".to_string(),
                desc: true
            })
        );
        assert_eq!(SortBy::parse("namespace").map(|s| s.desc), Some(false));
        assert_eq!(SortBy::parse("-"), None);
        assert_eq!(SortBy::parse(""), None);
    }

    #[test]
    fn test_refresh_rate() {
        assert!(validate_refresh_rate(30).is_ok());
        assert!(validate_refresh_rate(0).is_ok());
        assert!(validate_refresh_rate(45).is_err());
        assert_eq!(parse_refresh_rate("off").unwrap(), 0);
        assert_eq!(parse_refresh_rate("60s").unwrap(), 60);
        assert!(parse_refresh_rate("soon").is_err());
        assert_eq!(format_refresh_rate(0), "off");
        assert_eq!(format_refresh_rate(120), "120s");
    }

    #[test]
    fn test_settings_deserialization_defaults() {
        let settings: TableSettings = serde_yaml::from_str("showSystemResources: true").unwrap();
        assert!(settings.show_system_resources);
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.auto_refresh_rate, 0);
    }
}
