//! Table state: filtering, sorting, paging and persisted settings

use svcview::backend::Service;
use svcview::table::{
    DefaultDatatableSettings, SERVICES_TABLE_KEY, SettingsStore, SortBy, TableSettings, TableState,
};

fn svc(namespace: &str, name: &str, service_type: &str) -> Service {
    Service {
        name: name.to_string(),
        namespace: namespace.to_string(),
        service_type: service_type.to_string(),
        ..Default::default()
    }
}

fn fixture() -> Vec<Service> {
    vec![
        svc("default", "web", "ClusterIP"),
        svc("kube-system", "kube-dns", "ClusterIP"),
        svc("staging", "api", "NodePort"),
        svc("monitoring", "grafana", "LoadBalancer"),
    ]
}

fn row_names(rows: &[&Service]) -> Vec<String> {
    rows.iter().map(|s| s.name.clone()).collect()
}

#[test]
fn test_system_namespaces_hidden_by_default() {
    let services = fixture();
    let state = TableState::new(SERVICES_TABLE_KEY, TableSettings::default())
        .with_system_namespaces(vec!["monitoring".to_string()]);

    assert_eq!(row_names(&state.visible(&services)), vec!["web", "api"]);
}

#[test]
fn test_show_system_resources_and_search() {
    let services = fixture();
    let mut state = TableState::new(SERVICES_TABLE_KEY, TableSettings::default());
    state.set_show_system_resources(true).unwrap();
    state.set_search("CLUSTERIP");

    assert_eq!(row_names(&state.visible(&services)), vec!["web", "kube-dns"]);
}

#[test]
fn test_sort_and_page() {
    let services = fixture();
    let settings = TableSettings {
        page_size: 2,
        sort_by: SortBy::parse("-name"),
        show_system_resources: true,
        ..Default::default()
    };
    let state = TableState::new(SERVICES_TABLE_KEY, settings);

    let rows = state.visible(&services);
    assert_eq!(row_names(&rows), vec!["web", "kube-dns", "grafana", "api"]);
    assert_eq!(state.page_count(rows.len()), 2);
    assert_eq!(row_names(state.page(&rows, 1)), vec!["grafana", "api"]);
    assert!(state.page(&rows, 5).is_empty());
}

#[test]
fn test_settings_persist_but_search_does_not() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(dir.path());

    let mut state =
        TableState::load(store.clone(), SERVICES_TABLE_KEY, TableSettings::default()).unwrap();
    state.set_search("web");
    {
        let mut menu = DefaultDatatableSettings::new(&mut state);
        menu.set_show_system_resources(true).unwrap();
        menu.handle_refresh_rate_change(30).unwrap();
        menu.apply("pageSize", "25").unwrap();
    }

    let reloaded = TableState::load(store, SERVICES_TABLE_KEY, TableSettings::default()).unwrap();
    assert_eq!(reloaded.settings().page_size, 25);
    assert_eq!(reloaded.settings().auto_refresh_rate, 30);
    assert!(reloaded.settings().show_system_resources);
    assert_eq!(reloaded.search(), "");
}

#[test]
fn test_invalid_settings_are_rejected_and_not_saved() {
    let dir = tempfile::tempdir().unwrap();
    let store = SettingsStore::new(dir.path());
    let mut state =
        TableState::load(store.clone(), SERVICES_TABLE_KEY, TableSettings::default()).unwrap();

    let mut menu = DefaultDatatableSettings::new(&mut state);
    assert!(menu.handle_refresh_rate_change(7).is_err());
    assert!(menu.apply("autoRefreshRate", "soon").is_err());
    assert!(menu.apply("theme", "dark").is_err());

    assert_eq!(state.settings().auto_refresh_rate, 0);
    assert!(store.load(SERVICES_TABLE_KEY).unwrap().is_none());
}

#[test]
fn test_refresh_rate_menu_values() {
    let mut state = TableState::new(SERVICES_TABLE_KEY, TableSettings::default());
    let mut menu = DefaultDatatableSettings::new(&mut state);

    menu.apply("autoRefreshRate", "60s").unwrap();
    let controls = menu.controls();
    let refresh = controls
        .iter()
        .find(|c| c.key == "autoRefreshRate")
        .unwrap();
    assert_eq!(refresh.value, "60s");

    menu.apply("autoRefreshRate", "off").unwrap();
    assert_eq!(state.settings().auto_refresh_rate, 0);
}
