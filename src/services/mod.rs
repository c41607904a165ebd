//! Service layer
//!
//! This module sits between the CLI and the backends. It lists services
//! cluster-wide, caches the listing per environment and deletes services in
//! bulk, invalidating the cached listing afterwards.

mod delete;
mod lister;
pub mod query_keys;

pub use delete::{DeleteError, DeleteServices};
pub use lister::{ListError, NamespaceFailure, ServiceLister, ServiceListing};

use crate::backend::{Backend, DeletePayload, EnvironmentId, Service};
use crate::cache::{QueryCache, QueryState};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Cache holding cluster-wide service listings
pub type ServicesCache = QueryCache<Vec<Service>, ListError>;

/// Entry point for service queries and mutations of one backend
#[derive(Clone)]
pub struct ServicesApi {
    lister: ServiceLister,
    cache: Arc<ServicesCache>,
    delete: DeleteServices,
}

impl ServicesApi {
    pub fn new(lister: ServiceLister, stale_time: Duration) -> Self {
        let cache = Arc::new(ServicesCache::new(stale_time));
        let delete = DeleteServices::new(Arc::clone(lister.backend()), Arc::clone(&cache));
        Self {
            lister,
            cache,
            delete,
        }
    }

    /// Create an API with default lister settings
    pub fn with_backend(backend: Arc<dyn Backend>, stale_time: Duration) -> Self {
        Self::new(ServiceLister::new(backend), stale_time)
    }

    pub fn cache(&self) -> &Arc<ServicesCache> {
        &self.cache
    }

    pub fn lister(&self) -> &ServiceLister {
        &self.lister
    }

    fn listing_query(
        &self,
        env: EnvironmentId,
    ) -> impl Fn() -> futures::future::BoxFuture<'static, Result<Vec<Service>, ListError>>
    + Send
    + Sync
    + 'static {
        let lister = self.lister.clone();
        move || {
            let lister = lister.clone();
            async move { lister.list(env).await }.boxed()
        }
    }

    /// Cluster-wide services, served from the cache when fresh
    pub async fn services(&self, env: EnvironmentId) -> Result<Arc<Vec<Service>>, Arc<ListError>> {
        self.cache
            .fetch(&query_keys::cluster_services(env), self.listing_query(env))
            .await
    }

    /// Watch the cluster-wide listing; it is refetched whenever invalidated
    pub fn watch_services(
        &self,
        env: EnvironmentId,
    ) -> watch::Receiver<QueryState<Vec<Service>, ListError>> {
        self.cache
            .watch(&query_keys::cluster_services(env), self.listing_query(env))
    }

    /// Refetch the listing for watchers, joining a listing still in flight
    pub fn refresh(&self, env: EnvironmentId) {
        self.cache.refetch(&query_keys::cluster_services(env));
    }

    /// Delete services and invalidate the cached listing
    pub async fn delete_services(
        &self,
        env: EnvironmentId,
        payload: &DeletePayload,
    ) -> Result<(), DeleteError> {
        self.delete.execute(env, payload).await
    }
}
