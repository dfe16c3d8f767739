//! Serverset member descriptor and its JSON encoding.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::DiscoveryError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Dead,
    Starting,
    #[default]
    Alive,
    Stopping,
    Stopped,
    Warning,
}

/// One live endpoint published in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
    pub service_endpoint: Endpoint,
    /// Extra endpoints keyed by scheme or port name (`"http"`, `"https"`).
    #[serde(default)]
    pub additional_endpoints: BTreeMap<String, Endpoint>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<i32>,
}

impl ServiceInstance {
    pub fn new(service_endpoint: Endpoint) -> Self {
        Self {
            service_endpoint,
            additional_endpoints: BTreeMap::new(),
            status: Status::Alive,
            shard: None,
        }
    }

    pub fn with_additional(mut self, name: impl Into<String>, endpoint: Endpoint) -> Self {
        self.additional_endpoints.insert(name.into(), endpoint);
        self
    }

    pub fn unpack_json(data: &str) -> Result<Self, DiscoveryError> {
        serde_json::from_str(data).map_err(|e| DiscoveryError::Malformed(e.to_string()))
    }

    pub fn pack_json(&self) -> Result<String, DiscoveryError> {
        serde_json::to_string(self).map_err(|e| DiscoveryError::Malformed(e.to_string()))
    }

    /// `scheme://host:port` of the scheduler HTTP API advertised by this member.
    ///
    /// Prefers an `https` endpoint, then `http`, then the primary endpoint over http.
    pub fn scheduler_url(&self) -> String {
        for scheme in ["https", "http"] {
            if let Some(ep) = self.additional_endpoints.get(scheme) {
                return format!("{}://{}:{}", scheme, ep.host, ep.port);
            }
        }
        format!(
            "http://{}:{}",
            self.service_endpoint.host, self.service_endpoint.port
        )
    }
}
