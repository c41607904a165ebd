//! Kubernetes API backend
//!
//! Talks to the API server directly. A kube client is bound to one cluster, so
//! the environment id is only used for logging.

use super::{
    Backend, BackendError, DeletePayload, EnvironmentId, FetchOptions, NamespaceInfo, Service,
    ServicePort,
};
use async_trait::async_trait;
use futures::future::join_all;
use k8s_openapi::api::core::v1::{Namespace, Service as KubeService};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{DeleteParams, ListParams};
use kube::Api;
use std::collections::BTreeMap;

/// Namespaces created and owned by Kubernetes itself
const KUBE_SYSTEM_NAMESPACES: &[&str] = &["kube-system", "kube-public", "kube-node-lease"];

/// Backend backed by a `kube::Client`
pub struct KubeBackend {
    client: kube::Client,
}

impl KubeBackend {
    pub fn new(client: kube::Client) -> Self {
        Self { client }
    }
}

fn namespace_info(ns: Namespace) -> Option<NamespaceInfo> {
    let name = ns.metadata.name?;
    Some(NamespaceInfo {
        id: ns.metadata.uid.unwrap_or_default(),
        is_system: KUBE_SYSTEM_NAMESPACES.contains(&name.as_str()),
        is_default: name == "default",
        creation_date: ns.metadata.creation_timestamp.map(|t| t.0.to_string()),
        status: ns
            .status
            .and_then(|s| s.phase)
            .map(serde_json::Value::String),
        name,
    })
}

fn service_from_kube(svc: KubeService) -> Option<Service> {
    let meta = svc.metadata;
    let name = meta.name?;
    let spec = svc.spec.unwrap_or_default();

    let ports = spec
        .ports
        .unwrap_or_default()
        .into_iter()
        .map(|p| ServicePort {
            name: p.name.unwrap_or_default(),
            node_port: p.node_port.unwrap_or_default(),
            port: p.port,
            protocol: p.protocol.unwrap_or_else(|| "TCP".to_string()),
            target_port: match p.target_port {
                Some(IntOrString::Int(port)) => port.to_string(),
                Some(IntOrString::String(port)) => port,
                None => p.port.to_string(),
            },
        })
        .collect();

    Some(Service {
        name,
        uid: meta.uid.unwrap_or_default(),
        namespace: meta.namespace.unwrap_or_default(),
        service_type: spec.type_.unwrap_or_else(|| "ClusterIP".to_string()),
        cluster_ips: spec.cluster_ips.unwrap_or_default(),
        external_ips: spec.external_ips.unwrap_or_default(),
        external_name: spec.external_name,
        ports,
        selector: spec.selector.unwrap_or_default(),
        labels: meta.labels.unwrap_or_default(),
        annotations: meta.annotations.unwrap_or_default(),
        creation_timestamp: meta.creation_timestamp.map(|t| t.0.to_string()),
        applications: Vec::new(),
    })
}

#[async_trait]
impl Backend for KubeBackend {
    async fn namespaces(
        &self,
        env: EnvironmentId,
    ) -> Result<BTreeMap<String, NamespaceInfo>, BackendError> {
        tracing::debug!("Listing namespaces for environment {}", env);
        let api: Api<Namespace> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;

        Ok(list
            .items
            .into_iter()
            .filter_map(namespace_info)
            .map(|info| (info.name.clone(), info))
            .collect())
    }

    async fn services(
        &self,
        env: EnvironmentId,
        namespace: &str,
        options: FetchOptions,
    ) -> Result<Vec<Option<Service>>, BackendError> {
        if options.lookup_applications {
            // Application lookups are resolved by the console, not the API server
            tracing::trace!("Ignoring application lookup for {}/{}", env, namespace);
        }

        let api: Api<KubeService> = Api::namespaced(self.client.clone(), namespace);
        let list = api.list(&ListParams::default()).await?;

        Ok(list.items.into_iter().map(service_from_kube).collect())
    }

    async fn delete_services(
        &self,
        env: EnvironmentId,
        payload: &DeletePayload,
    ) -> Result<(), BackendError> {
        tracing::debug!(
            "Deleting {} service(s) in environment {}",
            payload.len(),
            env
        );

        let tasks = payload.iter().flat_map(|(namespace, names)| {
            let api: Api<KubeService> = Api::namespaced(self.client.clone(), namespace);
            names.iter().map(move |name| {
                let api = api.clone();
                async move {
                    let result = api.delete(name, &DeleteParams::default()).await;
                    match &result {
                        Ok(_) => tracing::info!("Deleted service {}/{}", namespace, name),
                        Err(err) => {
                            tracing::error!("Cannot delete service {}/{}: {}", namespace, name, err)
                        }
                    }
                    result
                }
            })
        });

        for result in join_all(tasks).await {
            result?;
        }

        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "kube"
    }
}
