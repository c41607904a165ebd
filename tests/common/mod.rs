//! Shared test helpers: an in-memory backend that records every call
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use svcview::backend::{
    Backend, BackendError, DeletePayload, EnvironmentId, FetchOptions, NamespaceInfo, Service,
};
use tokio::sync::Barrier;

pub fn service(namespace: &str, name: &str) -> Service {
    Service {
        name: name.to_string(),
        uid: format!("{}-{}", namespace, name),
        namespace: namespace.to_string(),
        service_type: "ClusterIP".to_string(),
        cluster_ips: vec!["10.0.0.1".to_string()],
        ..Default::default()
    }
}

pub fn api_error(message: &str) -> BackendError {
    BackendError::Api {
        status: 500,
        message: message.to_string(),
        details: None,
    }
}

pub fn names(services: &[Service]) -> Vec<&str> {
    services.iter().map(|s| s.name.as_str()).collect()
}

/// Backend over a map of namespace name to services
#[derive(Default)]
pub struct FakeBackend {
    namespaces: Mutex<BTreeMap<String, Vec<Option<Service>>>>,
    failing: HashSet<String>,
    discovery_fails: bool,
    delete_fails: bool,
    delays: HashMap<String, Duration>,
    barrier: Option<Arc<Barrier>>,
    pub discovery_calls: AtomicUsize,
    pub service_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    options_seen: Mutex<Vec<FetchOptions>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(self, namespace: &str, services: &[&str]) -> Self {
        let items = services
            .iter()
            .map(|name| Some(service(namespace, name)))
            .collect();
        self.with_items(namespace, items)
    }

    pub fn with_items(self, namespace: &str, items: Vec<Option<Service>>) -> Self {
        self.namespaces
            .lock()
            .unwrap()
            .insert(namespace.to_string(), items);
        self
    }

    /// Change the services of a namespace after construction
    pub fn with_items_mut<R>(
        &self,
        namespace: &str,
        f: impl FnOnce(&mut Vec<Option<Service>>) -> R,
    ) -> R {
        let mut namespaces = self.namespaces.lock().unwrap();
        f(namespaces.entry(namespace.to_string()).or_default())
    }

    /// Fetches of this namespace fail
    pub fn failing(mut self, namespace: &str) -> Self {
        self.failing.insert(namespace.to_string());
        self
    }

    pub fn failing_discovery(mut self) -> Self {
        self.discovery_fails = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.delete_fails = true;
        self
    }

    /// Fetches of this namespace take `delay` to complete
    pub fn delayed(mut self, namespace: &str, delay: Duration) -> Self {
        self.delays.insert(namespace.to_string(), delay);
        self
    }

    /// Every namespace fetch waits on `barrier` before answering
    pub fn with_barrier(mut self, barrier: Arc<Barrier>) -> Self {
        self.barrier = Some(barrier);
        self
    }

    pub fn discovery_calls(&self) -> usize {
        self.discovery_calls.load(Ordering::SeqCst)
    }

    pub fn service_calls(&self) -> usize {
        self.service_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn options_seen(&self) -> Vec<FetchOptions> {
        self.options_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn namespaces(
        &self,
        _env: EnvironmentId,
    ) -> Result<BTreeMap<String, NamespaceInfo>, BackendError> {
        self.discovery_calls.fetch_add(1, Ordering::SeqCst);
        if self.discovery_fails {
            return Err(api_error("Unable to retrieve namespaces"));
        }
        let namespaces = self.namespaces.lock().unwrap();
        Ok(namespaces
            .keys()
            .map(|name| {
                (
                    name.clone(),
                    NamespaceInfo {
                        id: name.clone(),
                        name: name.clone(),
                        is_default: name == "default",
                        ..Default::default()
                    },
                )
            })
            .collect())
    }

    async fn services(
        &self,
        _env: EnvironmentId,
        namespace: &str,
        options: FetchOptions,
    ) -> Result<Vec<Option<Service>>, BackendError> {
        self.service_calls.fetch_add(1, Ordering::SeqCst);
        self.options_seen.lock().unwrap().push(options);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(barrier) = &self.barrier {
            barrier.wait().await;
        }
        if let Some(delay) = self.delays.get(namespace) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(namespace) {
            return Err(api_error(&format!("Unable to retrieve services in {}", namespace)));
        }
        let namespaces = self.namespaces.lock().unwrap();
        Ok(namespaces.get(namespace).cloned().unwrap_or_default())
    }

    async fn delete_services(
        &self,
        _env: EnvironmentId,
        payload: &DeletePayload,
    ) -> Result<(), BackendError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.delete_fails {
            return Err(api_error("Unable to delete service(s)"));
        }
        let mut namespaces = self.namespaces.lock().unwrap();
        for (namespace, names) in payload.iter() {
            if let Some(items) = namespaces.get_mut(namespace) {
                items.retain(|item| match item {
                    Some(svc) => !names.contains(&svc.name),
                    None => true,
                });
            }
        }
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "fake"
    }
}
