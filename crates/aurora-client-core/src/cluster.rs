//! Cluster identity: how to reach one scheduler deployment.
//!
//! A cluster is reached either through the coordination registry (ZooKeeper
//! ensemble + serverset path, leader re-resolved on every reconnect) or through
//! one fixed scheduler URI. `proxy_url` only changes the externally advertised
//! URL, never the address the client connects to.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ZK_PORT: u16 = 2181;
pub const DEFAULT_SCHEDULER_ZK_PATH: &str = "/aurora/scheduler";
pub const DEFAULT_AUTH_MECHANISM: &str = "UNAUTHENTICATED";

/// Raised when a cluster names neither a registry ensemble nor a direct URI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cluster {cluster:?} does not specify zk or scheduler_uri")]
pub struct MissingTarget {
    pub cluster: String,
}

/// Immutable description of one scheduler cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    /// Comma-separated ZooKeeper ensemble hosts.
    #[serde(default)]
    pub zk: Option<String>,
    #[serde(default = "default_zk_port")]
    pub zk_port: u16,
    #[serde(default = "default_scheduler_zk_path")]
    pub scheduler_zk_path: String,
    #[serde(default)]
    pub scheduler_uri: Option<String>,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default = "default_auth_mechanism")]
    pub auth_mechanism: String,
}

fn default_zk_port() -> u16 {
    DEFAULT_ZK_PORT
}

fn default_scheduler_zk_path() -> String {
    DEFAULT_SCHEDULER_ZK_PATH.to_string()
}

fn default_auth_mechanism() -> String {
    DEFAULT_AUTH_MECHANISM.to_string()
}

impl Default for Cluster {
    fn default() -> Self {
        Self::named("")
    }
}

/// Registry coordinates of the scheduler serverset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZookeeperTarget {
    pub cluster: String,
    pub ensemble: String,
    pub port: u16,
    pub path: String,
}

impl ZookeeperTarget {
    /// Ensemble as `host:port` pairs, the form registry clients connect with.
    pub fn hosts(&self) -> Vec<String> {
        self.ensemble
            .split(',')
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(|h| {
                if h.contains(':') {
                    h.to_string()
                } else {
                    format!("{}:{}", h, self.port)
                }
            })
            .collect()
    }
}

/// Where the scheduler lives, as derived from a [`Cluster`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerTarget {
    Zookeeper(ZookeeperTarget),
    Direct { uri: String },
}

impl Cluster {
    /// A cluster with the given name and every other field defaulted.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zk: None,
            zk_port: DEFAULT_ZK_PORT,
            scheduler_zk_path: default_scheduler_zk_path(),
            scheduler_uri: None,
            proxy_url: None,
            auth_mechanism: default_auth_mechanism(),
        }
    }

    pub fn with_zk(mut self, ensemble: impl Into<String>) -> Self {
        self.zk = Some(ensemble.into());
        self
    }

    pub fn with_scheduler_uri(mut self, uri: impl Into<String>) -> Self {
        self.scheduler_uri = Some(uri.into());
        self
    }

    pub fn with_proxy_url(mut self, url: impl Into<String>) -> Self {
        self.proxy_url = Some(url.into());
        self
    }

    pub fn with_auth_mechanism(mut self, mechanism: impl Into<String>) -> Self {
        self.auth_mechanism = mechanism.into();
        self
    }

    /// Resolve the connection mode. A registry ensemble wins over a direct URI
    /// when both are present.
    pub fn target(&self) -> Result<SchedulerTarget, MissingTarget> {
        if let Some(zk) = non_empty(&self.zk) {
            return Ok(SchedulerTarget::Zookeeper(ZookeeperTarget {
                cluster: self.name.clone(),
                ensemble: zk.to_string(),
                port: self.zk_port,
                path: self.scheduler_zk_path.clone(),
            }));
        }
        if let Some(uri) = non_empty(&self.scheduler_uri) {
            return Ok(SchedulerTarget::Direct {
                uri: uri.to_string(),
            });
        }
        Err(MissingTarget {
            cluster: self.name.clone(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
