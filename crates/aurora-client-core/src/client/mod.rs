//! Scheduler client: locates the scheduler, connects, and hands out a stub.
//!
//! A client owns at most one live transport. [`SchedulerClient::get_thrift_client`]
//! connects lazily and caches the result; [`SchedulerClient::invalidate`] drops
//! it (and, for registry-backed clusters, the resolved leader) so the next call
//! starts over. Retrying failed RPCs is the proxy's job, not the client's.

mod direct;
mod error;
mod zookeeper;

pub use direct::DirectLocator;
pub use error::ClientError;
pub use zookeeper::ZookeeperLocator;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::auth::{default_auth_factory, AuthFactory, AuthProvider};
use crate::cluster::{Cluster, SchedulerTarget};
use crate::discovery::EndpointResolver;
use crate::retry::{Clock, Deadline, SystemClock};
use crate::rpc::{SchedulerStub, StubFactory, ThriftClient, ThriftJsonStubFactory};
use crate::transport::{
    bypass_leader_redirect_session_factory, CurlTransportFactory, Transport, TransportConfig,
    TransportFactory,
};

/// Path of the scheduler API below the scheduler's base URL.
const API_PATH: &str = "api";

/// Per-client knobs. Defaults match a stock scheduler deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub user_agent: String,
    /// Ask non-leading schedulers to serve the call instead of redirecting.
    pub bypass_leader_redirect: bool,
    /// Pause between failed connection attempts.
    pub connect_retry_interval: Duration,
    /// How long a proxied call keeps retrying one leader before resolving
    /// it again.
    pub connect_maximum_wait: Duration,
    /// How long to wait for the registry to advertise a leader.
    pub serverset_timeout: Duration,
    /// Give up connecting after this many attempts; `None` retries forever.
    pub max_connect_attempts: Option<u32>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            bypass_leader_redirect: false,
            connect_retry_interval: Duration::from_secs(1),
            connect_maximum_wait: Duration::from_secs(60),
            serverset_timeout: Duration::from_secs(10),
            max_connect_attempts: None,
        }
    }
}

pub fn default_user_agent() -> String {
    format!("aurora-client/{}", env!("CARGO_PKG_VERSION"))
}

/// Collaborators a client is built from. Tests swap in fakes; production uses
/// [`ClientDeps::default`] plus a resolver for registry-backed clusters.
#[derive(Clone)]
pub struct ClientDeps {
    pub transports: Arc<dyn TransportFactory>,
    pub stubs: Arc<dyn StubFactory>,
    pub resolver: Option<Arc<dyn EndpointResolver>>,
    pub clock: Arc<dyn Clock>,
    pub auth_factory: AuthFactory,
}

impl Default for ClientDeps {
    fn default() -> Self {
        Self {
            transports: Arc::new(CurlTransportFactory::default()),
            stubs: Arc::new(ThriftJsonStubFactory),
            resolver: None,
            clock: Arc::new(SystemClock),
            auth_factory: default_auth_factory(),
        }
    }
}

impl std::fmt::Debug for ClientDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientDeps")
            .field("resolver", &self.resolver.is_some())
            .finish_non_exhaustive()
    }
}

/// Bounds the connection attempts made on behalf of one proxied call.
#[derive(Debug, Clone, Copy)]
pub struct ConnectLimit<'a> {
    /// The call's deadline; connecting never sleeps past it.
    pub deadline: Deadline,
    /// Set when the caller is shutting down.
    pub cancelled: &'a AtomicBool,
}

/// How a client finds the scheduler to connect to.
pub enum Locator {
    Direct(DirectLocator),
    Zookeeper(ZookeeperLocator),
}

impl Locator {
    fn raw_url(&mut self) -> Result<String, ClientError> {
        match self {
            Locator::Direct(direct) => Ok(direct.uri().to_string()),
            Locator::Zookeeper(zk) => zk.raw_url(),
        }
    }

    fn url(&mut self) -> Result<String, ClientError> {
        match self {
            Locator::Direct(direct) => Ok(direct.uri().to_string()),
            Locator::Zookeeper(zk) => zk.url(),
        }
    }

    fn invalidate(&mut self) {
        if let Locator::Zookeeper(zk) = self {
            zk.invalidate();
        }
    }
}

/// `base` joined with the API path, e.g. `http://host:8081` -> `http://host:8081/api`.
fn api_uri(base: &str) -> Result<String, ClientError> {
    let url = url::Url::parse(base)
        .and_then(|u| u.join(API_PATH))
        .map_err(|e| ClientError::Configuration(format!("invalid scheduler URI {:?}: {}", base, e)))?;
    Ok(url.to_string())
}

struct Connection {
    transport: Box<dyn Transport>,
    stub: Box<dyn SchedulerStub>,
}

pub struct SchedulerClient {
    cluster: String,
    locator: Locator,
    auth: Arc<dyn AuthProvider>,
    options: ClientOptions,
    transports: Arc<dyn TransportFactory>,
    stubs: Arc<dyn StubFactory>,
    clock: Arc<dyn Clock>,
    connection: Option<Connection>,
    epoch: u64,
}

impl SchedulerClient {
    /// Build the client variant the cluster calls for. Does not connect.
    pub fn get(
        cluster: &Cluster,
        options: ClientOptions,
        deps: &ClientDeps,
    ) -> Result<Self, ClientError> {
        let locator = match cluster.target()? {
            SchedulerTarget::Zookeeper(target) => {
                let resolver = deps.resolver.clone().ok_or_else(|| {
                    ClientError::Configuration(format!(
                        "cluster {:?} uses zk {} but no scheduler resolver is configured",
                        cluster.name, target.ensemble
                    ))
                })?;
                debug!(cluster = %cluster.name, zk = %target.ensemble, "using zookeeper scheduler client");
                Locator::Zookeeper(ZookeeperLocator::new(
                    target,
                    resolver,
                    cluster.proxy_url.clone(),
                    options.serverset_timeout,
                ))
            }
            SchedulerTarget::Direct { uri } => {
                debug!(cluster = %cluster.name, %uri, "using direct scheduler client");
                Locator::Direct(DirectLocator::new(uri))
            }
        };
        let auth = (deps.auth_factory)(&cluster.auth_mechanism)?;
        let mut client = Self::new(locator, auth, options, deps);
        client.cluster = cluster.name.clone();
        Ok(client)
    }

    pub fn new(
        locator: Locator,
        auth: Arc<dyn AuthProvider>,
        options: ClientOptions,
        deps: &ClientDeps,
    ) -> Self {
        Self {
            cluster: String::new(),
            locator,
            auth,
            options,
            transports: Arc::clone(&deps.transports),
            stubs: Arc::clone(&deps.stubs),
            clock: Arc::clone(&deps.clock),
            connection: None,
            epoch: 0,
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Number of connections made so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn failed_auth_message(&self) -> String {
        self.auth.failed_auth_message()
    }

    /// Open a transport to `uri`, retrying network failures every
    /// `connect_retry_interval`. The same transport is reopened on each attempt.
    pub fn connect_scheduler(
        &self,
        uri: &str,
        clock: &dyn Clock,
    ) -> Result<Box<dyn Transport>, ClientError> {
        self.open_transport(uri, clock, None)
    }

    fn open_transport(
        &self,
        uri: &str,
        clock: &dyn Clock,
        limit: Option<&ConnectLimit<'_>>,
    ) -> Result<Box<dyn Transport>, ClientError> {
        let config = TransportConfig {
            auth: self.auth.auth(),
            user_agent: self.options.user_agent.clone(),
            session_factory: bypass_leader_redirect_session_factory(
                self.options.bypass_leader_redirect,
            ),
        };
        let mut transport = self.transports.create(uri, config);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match transport.open() {
                Ok(()) => return Ok(transport),
                Err(e) if e.is_network() => {
                    if self
                        .options
                        .max_connect_attempts
                        .is_some_and(|max| attempt >= max)
                    {
                        return Err(ClientError::CouldNotConnect {
                            uri: uri.to_string(),
                            reason: format!("{} (after {} attempts)", e, attempt),
                        });
                    }
                    let mut pause = self.options.connect_retry_interval;
                    if let Some(limit) = limit {
                        if limit.cancelled.load(Ordering::Relaxed) {
                            return Err(ClientError::Interrupted {
                                uri: uri.to_string(),
                            });
                        }
                        let remaining = limit.deadline.remaining(clock);
                        if remaining.is_zero() {
                            return Err(ClientError::ConnectTimeout {
                                uri: uri.to_string(),
                                attempts: attempt,
                                reason: e.to_string(),
                            });
                        }
                        pause = pause.min(remaining);
                    }
                    warn!(
                        %uri,
                        attempt,
                        "failed to connect to scheduler: {}, retrying in {:?}",
                        e,
                        pause
                    );
                    clock.sleep(pause);
                }
                Err(e) => {
                    return Err(ClientError::CouldNotConnect {
                        uri: uri.to_string(),
                        reason: e.to_string(),
                    })
                }
            }
        }
    }

    fn connect(&mut self, limit: Option<&ConnectLimit<'_>>) -> Result<Connection, ClientError> {
        let uri = api_uri(&self.locator.raw_url()?)?;
        let clock = Arc::clone(&self.clock);
        let window = limit.map(|limit| ConnectLimit {
            deadline: limit
                .deadline
                .capped(clock.as_ref(), self.options.connect_maximum_wait),
            cancelled: limit.cancelled,
        });
        let transport = self.open_transport(&uri, clock.as_ref(), window.as_ref())?;
        self.epoch += 1;
        info!(cluster = %self.cluster, %uri, epoch = self.epoch, "connected to scheduler");
        Ok(Connection {
            transport,
            stub: self.stubs.build(),
        })
    }

    /// The connected stub, connecting first if there is none.
    pub fn get_thrift_client(&mut self) -> Result<ThriftClient<'_>, ClientError> {
        self.thrift_client(None)
    }

    /// Like [`get_thrift_client`](Self::get_thrift_client), but a connect
    /// gives up at `limit.deadline` (or after `connect_maximum_wait`, if
    /// sooner) with [`ClientError::ConnectTimeout`], and stops early with
    /// [`ClientError::Interrupted`] once `limit.cancelled` is set.
    pub fn get_thrift_client_within(
        &mut self,
        limit: &ConnectLimit<'_>,
    ) -> Result<ThriftClient<'_>, ClientError> {
        self.thrift_client(Some(limit))
    }

    fn thrift_client(
        &mut self,
        limit: Option<&ConnectLimit<'_>>,
    ) -> Result<ThriftClient<'_>, ClientError> {
        let conn = match self.connection.take() {
            Some(conn) => {
                debug!(cluster = %self.cluster, epoch = self.epoch, "reusing scheduler connection");
                self.connection.insert(conn)
            }
            None => {
                let conn = self.connect(limit)?;
                self.connection.insert(conn)
            }
        };
        Ok(ThriftClient {
            transport: conn.transport.as_mut(),
            stub: conn.stub.as_mut(),
        })
    }

    /// Close the current connection, if any.
    pub fn close(&mut self) {
        if let Some(mut conn) = self.connection.take() {
            conn.transport.close();
            debug!(cluster = %self.cluster, epoch = self.epoch, "closed scheduler connection");
        }
    }

    /// Close the connection and forget the resolved leader.
    pub fn invalidate(&mut self) {
        self.close();
        self.locator.invalidate();
    }

    /// URL users should see for this scheduler. Never connects.
    pub fn url(&mut self) -> Result<String, ClientError> {
        self.locator.url()
    }

    /// URL of the scheduler itself, bypassing any proxy. Never connects.
    pub fn raw_url(&mut self) -> Result<String, ClientError> {
        self.locator.raw_url()
    }
}

impl Drop for SchedulerClient {
    fn drop(&mut self) {
        self.close();
    }
}
