//! Cluster-wide service listing
//!
//! Services are listed namespace by namespace: namespaces are discovered
//! first, then every namespace is fetched concurrently. A namespace that fails
//! to load is skipped so the others stay visible; only a failed discovery
//! fails the whole listing.

use crate::backend::{Backend, BackendError, EnvironmentId, FetchOptions, Service};
use futures::stream::{self, StreamExt};
use std::sync::Arc;

/// Listing could not be produced
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    /// Namespaces could not be discovered, so nothing was fetched
    #[error("Unable to get services")]
    Discovery(#[source] BackendError),
}

/// A namespace whose services could not be fetched
#[derive(Debug)]
pub struct NamespaceFailure {
    pub namespace: String,
    pub error: BackendError,
}

/// Services of every namespace that loaded, plus the namespaces that did not
#[derive(Debug, Default)]
pub struct ServiceListing {
    /// Services in discovery order, then backend order within a namespace
    pub items: Vec<Service>,
    pub failed_namespaces: Vec<NamespaceFailure>,
}

impl ServiceListing {
    /// Whether at least one namespace failed to load
    pub fn is_partial(&self) -> bool {
        !self.failed_namespaces.is_empty()
    }
}

/// Lists services across all namespaces of an environment
#[derive(Clone)]
pub struct ServiceLister {
    backend: Arc<dyn Backend>,
    lookup_applications: bool,
    max_concurrent: Option<usize>,
}

impl ServiceLister {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            lookup_applications: true,
            max_concurrent: None,
        }
    }

    /// Whether the backend should resolve applications behind each service
    pub fn lookup_applications(mut self, enabled: bool) -> Self {
        self.lookup_applications = enabled;
        self
    }

    /// Cap the number of namespace fetches in flight; unbounded by default
    pub fn with_concurrency(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = Some(max_concurrent.max(1));
        self
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    /// List every service the environment exposes
    ///
    /// Namespaces that fail to load are logged and left out. An environment
    /// where every namespace failed yields an empty list, not an error.
    pub async fn list(&self, env: EnvironmentId) -> Result<Vec<Service>, ListError> {
        Ok(self.list_detailed(env).await?.items)
    }

    /// List every service and report the namespaces that failed
    ///
    /// Each failed namespace is logged at `warn` before being reported.
    pub async fn list_detailed(&self, env: EnvironmentId) -> Result<ServiceListing, ListError> {
        let namespaces = self
            .backend
            .namespaces(env)
            .await
            .map_err(ListError::Discovery)?;
        let namespaces: Vec<String> = namespaces.into_keys().collect();

        tracing::debug!(
            "Fetching services from {} namespace(s) in environment {}",
            namespaces.len(),
            env
        );

        let options = FetchOptions {
            lookup_applications: self.lookup_applications,
        };
        let limit = self.max_concurrent.unwrap_or(namespaces.len()).max(1);
        let backend = &self.backend;

        // `buffered` keeps every fetch in flight up to `limit` and yields in input order
        let results: Vec<_> = stream::iter(namespaces)
            .map(|namespace| async move {
                let result = backend.services(env, &namespace, options).await;
                (namespace, result)
            })
            .buffered(limit)
            .collect()
            .await;

        let mut listing = ServiceListing::default();
        for (namespace, result) in results {
            match result {
                Ok(services) => listing.items.extend(services.into_iter().flatten()),
                Err(error) => {
                    tracing::warn!(
                        "Skipping namespace '{}' in environment {}: {}",
                        namespace,
                        env,
                        error
                    );
                    listing
                        .failed_namespaces
                        .push(NamespaceFailure { namespace, error });
                }
            }
        }

        tracing::debug!(
            "Listed {} service(s), {} namespace(s) failed",
            listing.items.len(),
            listing.failed_namespaces.len()
        );

        Ok(listing)
    }
}
