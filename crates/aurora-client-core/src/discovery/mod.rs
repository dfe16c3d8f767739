//! Leader discovery through the coordination registry.
//!
//! The client only depends on the [`EndpointResolver`] trait: given the
//! registry coordinates of a cluster, return the live scheduler members. How
//! the registry is reached (a ZooKeeper session, a mirrored directory, a fixed
//! list) is the resolver's business.

mod directory;
mod instance;

pub use directory::DirectoryResolver;
pub use instance::{Endpoint, ServiceInstance, Status};

use std::time::Duration;
use thiserror::Error;

use crate::cluster::ZookeeperTarget;

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no scheduler endpoints found in {path} within {timeout:?}")]
    Timeout { path: String, timeout: Duration },
    #[error("malformed serverset member: {0}")]
    Malformed(String),
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

/// Looks up the live scheduler members of a cluster.
pub trait EndpointResolver: Send + Sync {
    /// Members currently advertised under `target.path`, in registry order
    /// (the first member is the one the client connects to). Implementations
    /// must return within roughly `timeout`.
    fn lookup(
        &self,
        target: &ZookeeperTarget,
        timeout: Duration,
    ) -> Result<Vec<ServiceInstance>, DiscoveryError>;
}

/// Resolver over a fixed member list, e.g. from a static deployment manifest.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    instances: Vec<ServiceInstance>,
}

impl StaticResolver {
    pub fn new(instances: Vec<ServiceInstance>) -> Self {
        Self { instances }
    }
}

impl EndpointResolver for StaticResolver {
    fn lookup(
        &self,
        _target: &ZookeeperTarget,
        _timeout: Duration,
    ) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        Ok(self.instances.clone())
    }
}
