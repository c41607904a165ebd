//! Backend collaborators
//!
//! A backend knows how to discover the namespaces of an environment, list the
//! services of one namespace and delete services in bulk. Two implementations
//! are provided:
//! - `HttpBackend`: the management console REST API
//! - `KubeBackend`: the Kubernetes API server, through a kubeconfig client

mod error;
mod http;
mod cluster;
mod models;

pub use error::BackendError;
pub use http::HttpBackend;
pub use cluster::KubeBackend;
pub use models::{
    DeletePayload, EnvironmentId, FetchOptions, NamespaceInfo, Service, ServiceApplication,
    ServicePort,
};

use async_trait::async_trait;
use std::collections::BTreeMap;

/// Operations every backend provides
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// Discover the namespaces of an environment, keyed by name
    async fn namespaces(
        &self,
        env: EnvironmentId,
    ) -> Result<BTreeMap<String, NamespaceInfo>, BackendError>;

    /// List the services of one namespace
    ///
    /// `None` entries are placeholders some backends emit for unreadable items.
    async fn services(
        &self,
        env: EnvironmentId,
        namespace: &str,
        options: FetchOptions,
    ) -> Result<Vec<Option<Service>>, BackendError>;

    /// Delete services, grouped by namespace, as a single unit
    async fn delete_services(
        &self,
        env: EnvironmentId,
        payload: &DeletePayload,
    ) -> Result<(), BackendError>;

    /// Backend type name, used in logs
    fn backend_type(&self) -> &'static str;
}
