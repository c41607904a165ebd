//! Periodic refresh of a watched listing

mod common;

use common::{FakeBackend, names};
use std::sync::Arc;
use std::time::Duration;
use svcview::backend::EnvironmentId;
use svcview::services::ServicesApi;

const ENV: EnvironmentId = EnvironmentId(1);

#[tokio::test]
async fn test_refresh_faster_than_listing_still_delivers() {
    let backend = Arc::new(
        FakeBackend::new()
            .with_namespace("default", &["svc1"])
            .with_namespace("staging", &["svc3"])
            .delayed("default", Duration::from_millis(50)),
    );
    let api = ServicesApi::with_backend(backend.clone(), Duration::ZERO);

    let mut rx = api.watch_services(ENV);
    let mut ticker = tokio::time::interval(Duration::from_millis(10));
    let deadline = tokio::time::sleep(Duration::from_millis(600));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = ticker.tick() => api.refresh(ENV),
            changed = rx.changed() => changed.unwrap(),
        }
    }

    let state = rx.borrow().clone();
    let services = state.data.expect("watcher never received a listing");
    assert_eq!(names(&services), vec!["svc1", "svc3"]);
    // Every listing takes at least 50ms and refreshes join the one in flight
    assert!(backend.discovery_calls() <= 600 / 50 + 2);
}

#[tokio::test]
async fn test_refresh_picks_up_backend_changes() {
    let backend = Arc::new(FakeBackend::new().with_namespace("default", &["svc1"]));
    let api = ServicesApi::with_backend(backend.clone(), Duration::from_secs(300));

    let mut rx = api.watch_services(ENV);
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.data.is_some()))
        .await
        .unwrap()
        .unwrap();

    backend.with_items_mut("default", |items| {
        items.push(Some(common::service("default", "svc2")));
    });
    api.refresh(ENV);

    let state = tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| s.data.as_ref().is_some_and(|d| d.len() == 2)),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert!(!state.is_fetching);
    assert_eq!(backend.discovery_calls(), 2);
}
