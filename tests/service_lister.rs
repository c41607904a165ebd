//! Cluster-wide listing against an in-memory backend

mod common;

use common::{FakeBackend, names, service};
use std::sync::Arc;
use std::time::Duration;
use svcview::backend::EnvironmentId;
use svcview::services::{ListError, ServiceLister};
use tokio::sync::Barrier;

const ENV: EnvironmentId = EnvironmentId(1);

#[tokio::test]
async fn test_all_namespaces_succeed() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_namespace("default", &["svc1", "svc2"])
            .with_namespace("staging", &["svc3"]),
    );
    let lister = ServiceLister::new(backend.clone());

    let services = lister.list(ENV).await.unwrap();

    assert_eq!(names(&services), vec!["svc1", "svc2", "svc3"]);
    assert_eq!(backend.discovery_calls(), 1);
    assert_eq!(backend.service_calls(), 2);
}

#[tokio::test]
async fn test_failed_namespace_is_skipped() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_namespace("default", &["svc1", "svc2"])
            .with_namespace("kube-system", &["kube-dns"])
            .with_namespace("staging", &["svc3"])
            .failing("kube-system"),
    );
    let lister = ServiceLister::new(backend.clone());

    let services = lister.list(ENV).await.unwrap();

    assert_eq!(names(&services), vec!["svc1", "svc2", "svc3"]);
    assert_eq!(backend.service_calls(), 3);
}

#[tokio::test]
async fn test_detailed_listing_reports_failures() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_namespace("default", &["svc1"])
            .with_namespace("dev", &["api"])
            .with_namespace("prod", &["api"])
            .failing("dev")
            .failing("prod"),
    );
    let lister = ServiceLister::new(backend);

    let listing = lister.list_detailed(ENV).await.unwrap();

    assert!(listing.is_partial());
    assert_eq!(names(&listing.items), vec!["svc1"]);
    let failed: Vec<&str> = listing
        .failed_namespaces
        .iter()
        .map(|f| f.namespace.as_str())
        .collect();
    assert_eq!(failed, vec!["dev", "prod"]);
}

#[tokio::test]
async fn test_discovery_failure_fails_without_fetching() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_namespace("default", &["svc1"])
            .failing_discovery(),
    );
    let lister = ServiceLister::new(backend.clone());

    let err = lister.list(ENV).await.unwrap_err();

    assert!(matches!(err, ListError::Discovery(_)));
    assert_eq!(err.to_string(), "Unable to get services");
    assert_eq!(backend.service_calls(), 0);
}

#[tokio::test]
async fn test_every_namespace_failing_yields_empty_list() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_namespace("default", &["svc1"])
            .with_namespace("staging", &["svc3"])
            .failing("default")
            .failing("staging"),
    );
    let lister = ServiceLister::new(backend);

    let services = lister.list(ENV).await.unwrap();

    assert!(services.is_empty());
}

#[tokio::test]
async fn test_empty_namespaces_and_null_entries() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_namespace("empty", &[])
            .with_items("default", vec![Some(service("default", "web")), None]),
    );
    let lister = ServiceLister::new(backend);

    let services = lister.list(ENV).await.unwrap();

    assert_eq!(names(&services), vec!["web"]);
}

#[tokio::test]
async fn test_lookup_applications_is_forwarded() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_namespace("default", &["svc1"])
            .with_namespace("staging", &["svc3"]),
    );

    ServiceLister::new(backend.clone()).list(ENV).await.unwrap();
    ServiceLister::new(backend.clone())
        .lookup_applications(false)
        .list(ENV)
        .await
        .unwrap();

    let seen: Vec<bool> = backend
        .options_seen()
        .iter()
        .map(|o| o.lookup_applications)
        .collect();
    assert_eq!(seen, vec![true, true, false, false]);
}

#[tokio::test]
async fn test_namespace_fetches_run_concurrently() {
    // Each fetch waits until all three are in flight; sequential fetching would hang
    let backend = Arc::new(
        FakeBackend::new()
            .with_namespace("a", &["svc-a"])
            .with_namespace("b", &["svc-b"])
            .with_namespace("c", &["svc-c"])
            .with_barrier(Arc::new(Barrier::new(3))),
    );
    let lister = ServiceLister::new(backend.clone());

    let services = tokio::time::timeout(Duration::from_secs(5), lister.list(ENV))
        .await
        .expect("namespace fetches did not overlap")
        .unwrap();

    assert_eq!(names(&services), vec!["svc-a", "svc-b", "svc-c"]);
}

#[tokio::test]
async fn test_concurrency_limit_is_respected() {
    let mut backend = FakeBackend::new();
    for ns in ["a", "b", "c", "d", "e"] {
        backend = backend
            .with_namespace(ns, &["svc"])
            .delayed(ns, Duration::from_millis(20));
    }
    let backend = Arc::new(backend);
    let lister = ServiceLister::new(backend.clone()).with_concurrency(2);

    let services = lister.list(ENV).await.unwrap();

    assert_eq!(services.len(), 5);
    assert_eq!(
        backend
            .max_in_flight
            .load(std::sync::atomic::Ordering::SeqCst),
        2
    );
}

#[tokio::test]
async fn test_order_follows_discovery_not_completion() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_namespace("alpha", &["first"])
            .with_namespace("beta", &["second"])
            .with_namespace("gamma", &["third"])
            .delayed("alpha", Duration::from_millis(60))
            .delayed("beta", Duration::from_millis(30)),
    );
    let lister = ServiceLister::new(backend);

    let services = lister.list(ENV).await.unwrap();

    assert_eq!(names(&services), vec!["first", "second", "third"]);
}
