//! Cache keys for service queries

use crate::backend::EnvironmentId;
use crate::cache::QueryKey;

/// Every query of an environment
pub fn environment(env: EnvironmentId) -> QueryKey {
    QueryKey::new(["environments".to_string(), env.to_string()])
}

/// Cluster-wide service listing of an environment
pub fn cluster_services(env: EnvironmentId) -> QueryKey {
    QueryKey::new([
        "environments".to_string(),
        env.to_string(),
        "kubernetes".to_string(),
        "services".to_string(),
    ])
}
