//! Leader location through the coordination registry.

use std::sync::Arc;
use std::time::Duration;

use super::ClientError;
use crate::cluster::ZookeeperTarget;
use crate::discovery::{DiscoveryError, EndpointResolver};

/// Resolves the current leader from the scheduler serverset, once per
/// (re)connect. The resolved URL is cached until [`invalidate`](Self::invalidate).
pub struct ZookeeperLocator {
    target: ZookeeperTarget,
    resolver: Arc<dyn EndpointResolver>,
    proxy_url: Option<String>,
    serverset_timeout: Duration,
    raw_url: Option<String>,
}

impl ZookeeperLocator {
    pub fn new(
        target: ZookeeperTarget,
        resolver: Arc<dyn EndpointResolver>,
        proxy_url: Option<String>,
        serverset_timeout: Duration,
    ) -> Self {
        Self {
            target,
            resolver,
            proxy_url,
            serverset_timeout,
            raw_url: None,
        }
    }

    pub fn target(&self) -> &ZookeeperTarget {
        &self.target
    }

    /// `scheme://host:port` of the current leader, resolving it if needed.
    pub fn raw_url(&mut self) -> Result<String, ClientError> {
        if let Some(url) = &self.raw_url {
            return Ok(url.clone());
        }
        let url = self.resolve()?;
        self.raw_url = Some(url.clone());
        Ok(url)
    }

    /// The externally visible URL: the proxy when configured, else [`raw_url`](Self::raw_url).
    pub fn url(&mut self) -> Result<String, ClientError> {
        match &self.proxy_url {
            Some(proxy) => Ok(proxy.clone()),
            None => self.raw_url(),
        }
    }

    /// Forget the resolved leader; the next lookup queries the registry again.
    pub fn invalidate(&mut self) {
        self.raw_url = None;
    }

    fn resolve(&self) -> Result<String, ClientError> {
        let timeout = self.serverset_timeout;
        let members = match self.resolver.lookup(&self.target, timeout) {
            Ok(members) => members,
            Err(DiscoveryError::Timeout { .. }) => Vec::new(),
            Err(source) => {
                return Err(ClientError::Discovery {
                    cluster: self.target.cluster.clone(),
                    source,
                })
            }
        };
        let leader = members.first().ok_or_else(|| ClientError::DiscoveryTimeout {
            cluster: self.target.cluster.clone(),
            timeout,
        })?;
        let url = leader.scheduler_url();
        tracing::debug!(
            cluster = %self.target.cluster,
            path = %self.target.path,
            members = members.len(),
            "resolved scheduler leader at {}",
            url
        );
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientDeps, ClientOptions, SchedulerClient};
    use crate::cluster::Cluster;
    use crate::discovery::{Endpoint, ServiceInstance, StaticResolver};
    use crate::testing::{FakeTransportFactory, ScriptedStubs};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const HOST: &str = "some-host.example.com";
    const PORT: u16 = 31181;

    /// Resolver counting lookups and serving whatever member list it holds.
    struct CountingResolver {
        members: Mutex<Vec<ServiceInstance>>,
        lookups: AtomicUsize,
    }

    impl CountingResolver {
        fn new(members: Vec<ServiceInstance>) -> Arc<Self> {
            Arc::new(Self {
                members: Mutex::new(members),
                lookups: AtomicUsize::new(0),
            })
        }
    }

    impl EndpointResolver for CountingResolver {
        fn lookup(
            &self,
            _target: &ZookeeperTarget,
            _timeout: Duration,
        ) -> Result<Vec<ServiceInstance>, DiscoveryError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self.members.lock().unwrap().clone())
        }
    }

    fn member(scheme: &str) -> ServiceInstance {
        ServiceInstance::unpack_json(&format!(
            r#"{{
                "additionalEndpoints": {{"{scheme}": {{"host": "{HOST}", "port": {PORT}}}}},
                "serviceEndpoint": {{"host": "{HOST}", "port": {PORT}}},
                "shard": 0,
                "status": "ALIVE"
            }}"#
        ))
        .unwrap()
    }

    fn zk_client(
        proxy_url: Option<&str>,
        resolver: Arc<dyn EndpointResolver>,
        transports: &FakeTransportFactory,
    ) -> SchedulerClient {
        let mut cluster = Cluster::named("west").with_zk("zk.example.com");
        cluster.proxy_url = proxy_url.map(str::to_string);
        let deps = ClientDeps {
            transports: Arc::new(transports.clone()),
            stubs: Arc::new(ScriptedStubs::default()),
            resolver: Some(resolver),
            ..ClientDeps::default()
        };
        let options = ClientOptions {
            serverset_timeout: Duration::ZERO,
            ..ClientOptions::default()
        };
        SchedulerClient::get(&cluster, options, &deps).unwrap()
    }

    #[test]
    fn url_without_proxy_is_raw_url_and_does_not_connect() {
        for scheme in ["http", "https"] {
            let transports = FakeTransportFactory::new();
            let mut client = zk_client(None, Arc::new(StaticResolver::new(vec![member(scheme)])), &transports);
            let expected = format!("{}://{}:{}", scheme, HOST, PORT);
            assert_eq!(client.url().unwrap(), expected);
            assert_eq!(client.raw_url().unwrap(), expected);
            assert!(transports.created().is_empty());
            assert_eq!(client.epoch(), 0);
        }
    }

    #[test]
    fn proxy_url_overrides_url_but_not_raw_url() {
        for scheme in ["http", "https"] {
            let transports = FakeTransportFactory::new();
            let resolver = CountingResolver::new(vec![member(scheme)]);
            let mut client = zk_client(Some("https://scheduler.proxy"), resolver.clone(), &transports);

            assert_eq!(client.url().unwrap(), "https://scheduler.proxy");
            assert_eq!(resolver.lookups.load(Ordering::SeqCst), 0);
            assert_eq!(
                client.raw_url().unwrap(),
                format!("{}://{}:{}", scheme, HOST, PORT)
            );
            assert!(transports.created().is_empty());
        }
    }

    #[test]
    fn first_get_connects_once_and_caches() {
        let transports = FakeTransportFactory::new();
        let resolver = CountingResolver::new(vec![member("http")]);
        let mut client = zk_client(None, resolver.clone(), &transports);

        client.get_thrift_client().unwrap();
        assert_eq!(
            transports.created_uris(),
            vec![format!("http://{}:{}/api", HOST, PORT)]
        );
        assert_eq!(client.url().unwrap(), format!("http://{}:{}", HOST, PORT));

        client.get_thrift_client().unwrap();
        assert_eq!(transports.created().len(), 1);
        assert_eq!(transports.opens(), 1);
        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(client.epoch(), 1);
    }

    #[test]
    fn invalidate_re_resolves_new_leader() {
        let transports = FakeTransportFactory::new();
        let resolver = CountingResolver::new(vec![member("http")]);
        let mut client = zk_client(None, resolver.clone(), &transports);
        client.get_thrift_client().unwrap();

        *resolver.members.lock().unwrap() =
            vec![ServiceInstance::new(Endpoint::new("new-leader", 8081))];
        client.invalidate();
        assert_eq!(transports.closes(), 1);

        client.get_thrift_client().unwrap();
        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 2);
        assert_eq!(transports.created_uris()[1], "http://new-leader:8081/api");
        assert_eq!(client.raw_url().unwrap(), "http://new-leader:8081");
        assert_eq!(client.epoch(), 2);
    }

    #[test]
    fn empty_serverset_is_discovery_timeout() {
        let transports = FakeTransportFactory::new();
        let mut client = zk_client(None, Arc::new(StaticResolver::default()), &transports);
        let err = client.get_thrift_client().err().unwrap();
        assert!(matches!(err, ClientError::DiscoveryTimeout { ref cluster, .. } if cluster == "west"));
        assert!(transports.created().is_empty());
    }
}
