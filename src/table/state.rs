//! Table state: persisted settings merged with the transient search text

use super::settings::{validate_page_size, validate_refresh_rate, SortBy, TableSettings};
use super::SettingsStore;
use crate::backend::Service;
use anyhow::Result;
use std::cmp::Ordering;

/// Namespaces owned by Kubernetes or the console itself
pub const SYSTEM_NAMESPACES: &[&str] = &["kube-system", "kube-public", "kube-node-lease", "portainer"];

/// Whether `namespace` is a system namespace, including configured extras
pub fn is_system_namespace(namespace: &str, extra: &[String]) -> bool {
    SYSTEM_NAMESPACES.contains(&namespace) || extra.iter().any(|ns| ns == namespace)
}

/// State of one table
///
/// Settings setters write through to the store when one is attached. The
/// search text is never persisted.
#[derive(Debug, Clone)]
pub struct TableState {
    storage_key: String,
    settings: TableSettings,
    search: String,
    system_namespaces: Vec<String>,
    store: Option<SettingsStore>,
}

impl TableState {
    /// In-memory state, nothing is persisted
    pub fn new(storage_key: impl Into<String>, settings: TableSettings) -> Self {
        Self {
            storage_key: storage_key.into(),
            settings,
            search: String::new(),
            system_namespaces: Vec::new(),
            store: None,
        }
    }

    /// Load persisted settings for `storage_key`, falling back to `defaults`
    pub fn load(
        store: SettingsStore,
        storage_key: impl Into<String>,
        defaults: TableSettings,
    ) -> Result<Self> {
        let storage_key = storage_key.into();
        let settings = store.load(&storage_key)?.unwrap_or(defaults);
        Ok(Self {
            store: Some(store),
            ..Self::new(storage_key, settings)
        })
    }

    /// Treat these namespaces as system namespaces too
    pub fn with_system_namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.system_namespaces = namespaces;
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn settings(&self) -> &TableSettings {
        &self.settings
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<()> {
        self.settings.page_size = validate_page_size(page_size)?;
        self.persist()
    }

    pub fn set_sort_by(&mut self, sort_by: Option<SortBy>) -> Result<()> {
        self.settings.sort_by = sort_by;
        self.persist()
    }

    pub fn set_auto_refresh_rate(&mut self, rate: u64) -> Result<()> {
        self.settings.auto_refresh_rate = validate_refresh_rate(rate)?;
        self.persist()
    }

    pub fn set_show_system_resources(&mut self, show: bool) -> Result<()> {
        self.settings.show_system_resources = show;
        self.persist()
    }

    fn persist(&self) -> Result<()> {
        match &self.store {
            Some(store) => store.save(&self.storage_key, &self.settings),
            None => Ok(()),
        }
    }

    fn matches_search(&self, service: &Service) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        [
            service.name.as_str(),
            service.namespace.as_str(),
            service.service_type.as_str(),
            service.cluster_ip().unwrap_or_default(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Rows to display: filtered by search and system namespaces, then sorted
    pub fn visible<'a>(&self, services: &'a [Service]) -> Vec<&'a Service> {
        let mut rows: Vec<&Service> = services
            .iter()
            .filter(|svc| {
                self.settings.show_system_resources
                    || !is_system_namespace(&svc.namespace, &self.system_namespaces)
            })
            .filter(|svc| self.matches_search(svc))
            .collect();

        if let Some(sort) = &self.settings.sort_by {
            rows.sort_by(|a, b| {
                let ord = compare_by(a, b, &sort.id);
                if sort.desc { ord.reverse() } else { ord }
            });
        }
        rows
    }

    /// Rows of page `index` (0-based)
    pub fn page<'a, 'b>(&self, rows: &'b [&'a Service], index: usize) -> &'b [&'a Service] {
        let start = index.saturating_mul(self.settings.page_size).min(rows.len());
        let end = start.saturating_add(self.settings.page_size).min(rows.len());
        &rows[start..end]
    }

    /// Number of pages needed for `rows` rows
    pub fn page_count(&self, rows: usize) -> usize {
        rows.div_ceil(self.settings.page_size.max(1))
    }
}

fn compare_by(a: &Service, b: &Service, column: &str) -> Ordering {
    match column {
        "namespace" => a.namespace.cmp(&b.namespace).then_with(|| a.name.cmp(&b.name)),
        "type" => a.service_type.cmp(&b.service_type),
        "created" => a.creation_timestamp.cmp(&b.creation_timestamp),
        "clusterIp" => a.cluster_ip().cmp(&b.cluster_ip()),
        _ => a.name.cmp(&b.name),
    }
}
