//! Table state for list views
//!
//! A table combines persisted settings (page size, sorting, auto-refresh,
//! system resources visibility) with a search string that lives only as long
//! as the view.

pub mod settings;
mod state;
mod store;

pub use settings::{DefaultDatatableSettings, SortBy, TableSettings, AUTO_REFRESH_RATES};
pub use state::{is_system_namespace, TableState, SYSTEM_NAMESPACES};
pub use store::SettingsStore;

/// Storage key of the cluster-wide services table
pub const SERVICES_TABLE_KEY: &str = "kubernetes.services";
