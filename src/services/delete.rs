//! Bulk service deletion

use super::{query_keys, ServicesCache};
use crate::backend::{Backend, BackendError, DeletePayload, EnvironmentId};
use std::sync::Arc;

/// Deletion failed; nothing was invalidated
#[derive(Debug, thiserror::Error)]
pub enum DeleteError {
    #[error("Unable to delete service(s)")]
    Backend(#[source] BackendError),
}

/// Deletes services and invalidates the cached cluster listing on success
#[derive(Clone)]
pub struct DeleteServices {
    backend: Arc<dyn Backend>,
    cache: Arc<ServicesCache>,
}

impl DeleteServices {
    pub fn new(backend: Arc<dyn Backend>, cache: Arc<ServicesCache>) -> Self {
        Self { backend, cache }
    }

    pub async fn execute(
        &self,
        env: EnvironmentId,
        payload: &DeletePayload,
    ) -> Result<(), DeleteError> {
        if payload.is_empty() {
            tracing::debug!("Nothing to delete in environment {}", env);
            return Ok(());
        }

        self.backend
            .delete_services(env, payload)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete services in environment {}: {}", env, e);
                DeleteError::Backend(e)
            })?;

        tracing::info!("Deleted {} service(s) in environment {}", payload.len(), env);
        self.cache.invalidate(&query_keys::cluster_services(env));
        Ok(())
    }
}
