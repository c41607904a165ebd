//! Management console REST backend

use super::{Backend, BackendError, DeletePayload, EnvironmentId, FetchOptions, NamespaceInfo, Service};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

const API_KEY_HEADER: &str = "X-API-Key";

/// Backend talking to the console API under `{base}/api/`
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: Url,
    api_key: Option<String>,
}

impl HttpBackend {
    /// Create a new HTTP backend
    ///
    /// `base_url` is the console address, e.g. `https://console.example.com`.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self> {
        let mut api_url =
            Url::parse(base_url).with_context(|| format!("Invalid backend URL: {}", base_url))?;
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }
        let api_url = api_url
            .join("api/")
            .context("Failed to build API base URL")?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .context("Failed to create HTTP client")?;

        tracing::debug!("Created HTTP backend for: {}", api_url);

        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }

    /// Resolve a path relative to the API root
    fn url(&self, path: &str) -> Result<Url, BackendError> {
        self.api_url.join(path).map_err(|e| BackendError::Api {
            status: 0,
            message: format!("Invalid request path: {}", path),
            details: Some(e.to_string()),
        })
    }

    /// Apply the API key, when configured
    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header(API_KEY_HEADER, key),
            None => req,
        }
    }

    /// Send a request and decode a JSON body, mapping failures to `BackendError`
    async fn send_json<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
        fallback: &str,
    ) -> Result<T, BackendError> {
        let resp = self.apply_auth(req).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(BackendError::from_response(status.as_u16(), &body, fallback));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// List services of a namespace straight from the Kubernetes API proxy
    ///
    /// Unlike [`Backend::services`], items are returned as raw Kubernetes
    /// objects without application lookups.
    pub async fn namespace_services(
        &self,
        env: EnvironmentId,
        namespace: &str,
        query: &[(String, String)],
    ) -> Result<Vec<k8s_openapi::api::core::v1::Service>, BackendError> {
        let url = self.url(&format!(
            "endpoints/{}/kubernetes/api/v1/namespaces/{}/services",
            env, namespace
        ))?;
        tracing::debug!("Fetching raw services from: {}", url);

        let list: k8s_openapi::List<k8s_openapi::api::core::v1::Service> = self
            .send_json(self.client.get(url).query(query), "Unable to retrieve services")
            .await?;
        Ok(list.items)
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn namespaces(
        &self,
        env: EnvironmentId,
    ) -> Result<BTreeMap<String, NamespaceInfo>, BackendError> {
        let url = self.url(&format!("kubernetes/{}/namespaces", env))?;
        tracing::debug!("Fetching namespaces from: {}", url);

        self.send_json(self.client.get(url), "Unable to retrieve namespaces")
            .await
    }

    async fn services(
        &self,
        env: EnvironmentId,
        namespace: &str,
        options: FetchOptions,
    ) -> Result<Vec<Option<Service>>, BackendError> {
        let url = self.url(&format!(
            "kubernetes/{}/namespaces/{}/services",
            env, namespace
        ))?;
        tracing::debug!("Fetching services from: {}", url);

        let req = self.client.get(url).query(&[(
            "lookupapplications",
            options.lookup_applications.to_string(),
        )]);
        let services: Option<Vec<Option<Service>>> = self
            .send_json(req, "Unable to retrieve services")
            .await?;
        Ok(services.unwrap_or_default())
    }

    async fn delete_services(
        &self,
        env: EnvironmentId,
        payload: &DeletePayload,
    ) -> Result<(), BackendError> {
        let url = self.url(&format!("kubernetes/{}/services/delete", env))?;
        tracing::debug!("Deleting {} service(s) via: {}", payload.len(), url);

        let resp = self
            .apply_auth(self.client.post(url).json(payload))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::from_response(
                status.as_u16(),
                &body,
                "Unable to delete service(s)",
            ));
        }

        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(base: &str) -> HttpBackend {
        HttpBackend::new(base, None, Duration::from_secs(5), false).unwrap()
    }

    #[test]
    fn test_api_url_without_trailing_slash() {
        let b = backend("https://console.example.com");
        assert_eq!(
            b.url("kubernetes/1/namespaces").unwrap().as_str(),
            "https://console.example.com/api/kubernetes/1/namespaces"
        );
    }

    #[test]
    fn test_api_url_with_path_prefix() {
        let b = backend("https://example.com/console/");
        assert_eq!(
            b.url("kubernetes/2/services/delete").unwrap().as_str(),
            "https://example.com/console/api/kubernetes/2/services/delete"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpBackend::new("not a url", None, Duration::from_secs(1), false).is_err());
    }

    #[test]
    fn test_raw_service_list_path_and_body() {
        let b = backend("https://console.example.com");
        assert_eq!(
            b.url("endpoints/3/kubernetes/api/v1/namespaces/default/services")
                .unwrap()
                .as_str(),
            "https://console.example.com/api/endpoints/3/kubernetes/api/v1/namespaces/default/services"
        );

        let body = r#"{
            "apiVersion": "v1",
            "kind": "ServiceList",
            "metadata": {},
            "items": [{"metadata": {"name": "web", "namespace": "default"}}]
        }"#;
        let list: k8s_openapi::List<k8s_openapi::api::core::v1::Service> =
            serde_json::from_str(body).unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].metadata.name.as_deref(), Some("web"));
    }
}
