//! Kubernetes client module
//!
//! Builds the client used by the Kubernetes API backend.
//!
//! HTTP/HTTPS proxies are honoured through the `proxy-url` field of the
//! kubeconfig cluster entry.

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

/// Initialize and return a Kubernetes client
///
/// Without a context, the default loading strategy applies:
/// 1. In-cluster config (if running in a pod)
/// 2. KUBECONFIG environment variable
/// 3. ~/.kube/config
///
/// With a context, that context of the kubeconfig is used.
pub async fn create_client(context: Option<&str>) -> Result<Client> {
    let config = match context {
        Some(name) => {
            let options = KubeConfigOptions {
                context: Some(name.to_string()),
                ..Default::default()
            };
            Config::from_kubeconfig(&options)
                .await
                .with_context(|| format!("Failed to load kubeconfig context '{}'", name))?
        }
        None => Config::infer()
            .await
            .context("Failed to infer Kubernetes configuration")?,
    };

    tracing::debug!("Connecting to Kubernetes API at {}", config.cluster_url);
    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Name of the current kubeconfig context, if any
pub fn current_context() -> Option<String> {
    Kubeconfig::read()
        .ok()
        .and_then(|kubeconfig| kubeconfig.current_context)
}
