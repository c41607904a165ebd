//! Wire models shared by all backends
//!
//! Field names follow the console API, which serializes in PascalCase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Identifier of a managed environment (one Kubernetes cluster)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvironmentId(pub u64);

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EnvironmentId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(EnvironmentId)
    }
}

/// Namespace metadata returned by discovery
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NamespaceInfo {
    pub id: String,
    pub name: String,
    pub creation_date: Option<String>,
    pub status: Option<serde_json::Value>,
    pub is_system: bool,
    pub is_default: bool,
}

/// Options for a per-namespace service fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// Ask the backend to resolve applications exposed by each service
    pub lookup_applications: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            lookup_applications: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServicePort {
    pub name: String,
    pub node_port: i32,
    pub port: i32,
    pub protocol: String,
    pub target_port: String,
}

/// Application exposed through a service, when the backend resolved it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ServiceApplication {
    pub name: String,
    #[serde(rename = "Type")]
    pub kind: String,
    pub namespace: String,
}

/// A Kubernetes service as listed by the console
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Service {
    pub name: String,
    #[serde(rename = "UID")]
    pub uid: String,
    pub namespace: String,
    #[serde(rename = "Type")]
    pub service_type: String,
    #[serde(rename = "ClusterIPs")]
    pub cluster_ips: Vec<String>,
    #[serde(rename = "ExternalIPs")]
    pub external_ips: Vec<String>,
    pub external_name: Option<String>,
    pub ports: Vec<ServicePort>,
    pub selector: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub creation_timestamp: Option<String>,
    pub applications: Vec<ServiceApplication>,
}

impl Service {
    /// First cluster IP, if any
    pub fn cluster_ip(&self) -> Option<&str> {
        self.cluster_ips.first().map(String::as_str)
    }

    /// Ports rendered as `port/protocol`, or `port:nodePort/protocol` when exposed on nodes, comma separated
    pub fn ports_summary(&self) -> String {
        self.ports
            .iter()
            .map(|p| {
                if p.node_port > 0 {
                    format!("{}:{}/{}", p.port, p.node_port, p.protocol)
                } else {
                    format!("{}/{}", p.port, p.protocol)
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Services to delete, grouped by namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeletePayload(pub BTreeMap<String, Vec<String>>);

impl DeletePayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service to the payload
    pub fn push(&mut self, namespace: impl Into<String>, name: impl Into<String>) {
        self.0.entry(namespace.into()).or_default().push(name.into());
    }

    /// Build a payload from `namespace/name` references
    pub fn from_refs<I, S>(refs: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut payload = Self::new();
        for r in refs {
            let r = r.as_ref();
            let (namespace, name) = r
                .split_once('/')
                .filter(|(ns, name)| !ns.is_empty() && !name.is_empty())
                .ok_or_else(|| {
                    anyhow::anyhow!("Invalid service reference '{}', expected namespace/name", r)
                })?;
            payload.push(namespace, name);
        }
        Ok(payload)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Total number of services in the payload
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }
}
