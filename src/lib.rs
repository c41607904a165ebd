//! svcview library
//!
//! Cluster-wide service listing for the Kubernetes environments of a
//! management console: namespaces are queried in parallel and partial
//! failures are tolerated, listings are cached per environment, and bulk
//! deletions invalidate the cached listing.

pub mod backend;
pub mod cache;
pub mod cli;
pub mod config;
pub mod kube;
pub mod services;
pub mod table;

// Re-export commonly used types for convenience
pub use backend::{Backend, BackendError, DeletePayload, EnvironmentId, Service};
pub use cache::{QueryCache, QueryKey, QueryState, QueryStatus};
pub use services::{DeleteError, ListError, ServiceLister, ServiceListing, ServicesApi};
pub use table::{TableSettings, TableState};
