use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::client::{default_user_agent, ClientDeps, ClientOptions};
use crate::cluster::Cluster;
use crate::discovery::DirectoryResolver;
use crate::proxy::SchedulerProxy;
use crate::retry::RetryPolicy;

/// Connection and RPC retry timing (optional section in config.toml).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Pause between attempts to open a connection, in seconds.
    pub connect_retry_interval_secs: f64,
    /// How long one call retries an unreachable leader before resolving it again.
    pub connect_maximum_wait_secs: u64,
    /// Delay before the first RPC retry; doubles per attempt.
    pub rpc_retry_interval_secs: f64,
    /// Maximum delay between RPC retries.
    pub max_rpc_retry_interval_secs: u64,
    /// Total time one RPC may spend retrying.
    pub rpc_maximum_wait_secs: u64,
    /// How long to wait for the registry to advertise a leader.
    pub serverset_timeout_secs: u64,
    /// Cap on connection attempts; unset retries forever.
    pub max_connect_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            connect_retry_interval_secs: 1.0,
            connect_maximum_wait_secs: 60,
            rpc_retry_interval_secs: 5.0,
            max_rpc_retry_interval_secs: 30,
            rpc_maximum_wait_secs: 600,
            serverset_timeout_secs: 10,
            max_connect_attempts: None,
        }
    }
}

/// Where scheduler serverset members are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Directory mirroring the registry: members of `<zk path>` live under
    /// `<serverset_root>/<zk path>/member_*`.
    pub serverset_root: PathBuf,
}

/// Global configuration loaded from `~/.config/aurora-client/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub user_agent: String,
    /// Send `Bypass-Leader-Redirect: true` with every request.
    #[serde(default)]
    pub bypass_leader_redirect: bool,
    /// Optional retry timing; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Needed only for clusters that locate the scheduler through zk.
    #[serde(default)]
    pub discovery: Option<DiscoveryConfig>,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            bypass_leader_redirect: false,
            retry: None,
            discovery: None,
            clusters: Vec::new(),
        }
    }
}

impl ClientConfig {
    fn retry_config(&self) -> RetryConfig {
        self.retry.clone().unwrap_or_default()
    }

    pub fn client_options(&self) -> ClientOptions {
        let retry = self.retry_config();
        ClientOptions {
            user_agent: self.user_agent.clone(),
            bypass_leader_redirect: self.bypass_leader_redirect,
            connect_retry_interval: secs_f64(retry.connect_retry_interval_secs),
            connect_maximum_wait: Duration::from_secs(retry.connect_maximum_wait_secs),
            serverset_timeout: Duration::from_secs(retry.serverset_timeout_secs),
            max_connect_attempts: retry.max_connect_attempts,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let retry = self.retry_config();
        RetryPolicy {
            base_delay: secs_f64(retry.rpc_retry_interval_secs),
            max_delay: Duration::from_secs(retry.max_rpc_retry_interval_secs),
            max_wait: Duration::from_secs(retry.rpc_maximum_wait_secs),
        }
    }

    /// Production collaborators, with a serverset resolver when one is configured.
    pub fn client_deps(&self) -> ClientDeps {
        let mut deps = ClientDeps::default();
        if let Some(discovery) = &self.discovery {
            deps.resolver = Some(Arc::new(DirectoryResolver::new(
                &discovery.serverset_root,
                Arc::clone(&deps.clock),
            )));
        }
        deps
    }

    pub fn cluster(&self, name: &str) -> Option<&Cluster> {
        self.clusters.iter().find(|c| c.name == name)
    }

    /// A proxy for the named cluster, configured from this file.
    pub fn proxy(&self, cluster: &str) -> Result<SchedulerProxy> {
        let cluster = self
            .cluster(cluster)
            .with_context(|| format!("unknown cluster {:?}", cluster))?
            .clone();
        Ok(
            SchedulerProxy::new(cluster, self.client_options(), self.client_deps())
                .with_retry_policy(self.retry_policy()),
        )
    }
}

/// Negative or non-finite values fall back to zero.
fn secs_f64(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("aurora-client")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ClientConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ClientConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<ClientConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: ClientConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
