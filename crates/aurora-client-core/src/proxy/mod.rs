//! Resilient front end to the scheduler API.
//!
//! Every RPC goes through [`SchedulerProxy::invoke_with`]: arguments are shaped
//! by the method table, the call is issued on the cached client, and transient
//! failures (`ERROR_TRANSIENT`, timeouts, a leader that stays unreachable)
//! invalidate the connection and retry with backoff until the call's deadline
//! runs out. Reconnects happen inside that same deadline.

mod error;
mod verbs;

pub use error::ProxyError;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::client::{ClientDeps, ClientError, ClientOptions, ConnectLimit, SchedulerClient};
use crate::cluster::Cluster;
use crate::retry::{classify_outcome, Deadline, RetryDecision, RetryPolicy, RpcOutcome};
use crate::rpc::{Method, Response, RpcError};

/// Per-call flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// The call is idempotent: a dropped connection may be retried instead of
    /// failing the call.
    pub retry: bool,
}

impl CallOptions {
    pub fn retriable() -> Self {
        Self { retry: true }
    }
}

/// Stops a proxy's retry loops from another thread.
#[derive(Debug, Clone)]
pub struct TerminationHandle(Arc<AtomicBool>);

impl TerminationHandle {
    pub fn terminate(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_terminating(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct SchedulerProxy {
    cluster: Cluster,
    options: ClientOptions,
    deps: ClientDeps,
    policy: RetryPolicy,
    client: Option<SchedulerClient>,
    terminating: Arc<AtomicBool>,
}

impl SchedulerProxy {
    /// The client is built lazily on the first call.
    pub fn new(cluster: Cluster, options: ClientOptions, deps: ClientDeps) -> Self {
        Self {
            cluster,
            options,
            deps,
            policy: RetryPolicy::default(),
            client: None,
            terminating: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn termination_handle(&self) -> TerminationHandle {
        TerminationHandle(Arc::clone(&self.terminating))
    }

    /// Abandon in-flight retries and refuse further calls.
    pub fn terminate(&self) {
        self.terminating.store(true, Ordering::Relaxed);
    }

    fn is_terminating(&self) -> bool {
        self.terminating.load(Ordering::Relaxed)
    }

    /// The session's scheduler client, built on first use.
    pub fn scheduler_client(&mut self) -> Result<&mut SchedulerClient, ClientError> {
        let client = match self.client.take() {
            Some(client) => client,
            None => SchedulerClient::get(&self.cluster, self.options.clone(), &self.deps)?,
        };
        Ok(self.client.insert(client))
    }

    /// Drop the current connection; the next call reconnects (and re-resolves
    /// the leader for registry-backed clusters).
    pub fn invalidate(&mut self) {
        if let Some(client) = self.client.as_mut() {
            client.invalidate();
        }
    }

    /// User-facing scheduler URL.
    pub fn url(&mut self) -> Result<String, ClientError> {
        self.scheduler_client()?.url()
    }

    pub fn invoke(&mut self, method: Method, args: Vec<Value>) -> Result<Response, ProxyError> {
        self.invoke_with(method, args, CallOptions::default())
    }

    /// Issue `method`, retrying transient failures within the retry policy's
    /// deadline.
    pub fn invoke_with(
        &mut self,
        method: Method,
        args: Vec<Value>,
        call: CallOptions,
    ) -> Result<Response, ProxyError> {
        let name = method.name();
        let args = method.spec().adapt(args)?;
        let clock = Arc::clone(&self.deps.clock);
        let deadline = Deadline::after(clock.as_ref(), self.policy.max_wait);
        let terminating = Arc::clone(&self.terminating);
        let limit = ConnectLimit {
            deadline,
            cancelled: &terminating,
        };
        let mut last_error = String::new();

        let mut attempt: u32 = 0;
        loop {
            if self.is_terminating() {
                return Err(ProxyError::Terminated {
                    method: name,
                    cluster: self.cluster.name.clone(),
                });
            }
            if attempt > 0 && deadline.is_expired(clock.as_ref()) {
                error!(cluster = %self.cluster.name, method = name, attempts = attempt, "giving up: {}", last_error);
                return Err(ProxyError::Timeout {
                    method: name,
                    cluster: self.cluster.name.clone(),
                    last_error,
                });
            }
            attempt += 1;

            let outcome = match self.call_once(method, &args, &limit) {
                Ok(result) => classify_outcome(result, call.retry),
                Err(ClientError::Interrupted { .. }) => continue,
                Err(source @ ClientError::ConnectTimeout { .. }) => {
                    RpcOutcome::TransientFailure(source.to_string())
                }
                Err(source) => {
                    // Start from scratch next time: the client may be half-built.
                    self.client = None;
                    return Err(ProxyError::Client {
                        method: name,
                        cluster: self.cluster.name.clone(),
                        source,
                    });
                }
            };

            match outcome {
                RpcOutcome::Success(resp) => {
                    if attempt > 1 {
                        info!(cluster = %self.cluster.name, method = name, attempt, "call succeeded after retry");
                    }
                    return Ok(resp);
                }
                RpcOutcome::AuthFailure(detail) => {
                    let message = self
                        .client
                        .as_ref()
                        .map(SchedulerClient::failed_auth_message)
                        .unwrap_or_default();
                    error!(cluster = %self.cluster.name, method = name, "authentication failed ({}): {}", detail, message);
                    self.invalidate();
                    return Err(ProxyError::Auth {
                        method: name,
                        message,
                    });
                }
                RpcOutcome::PermanentFailure(RpcError::Transport(source)) => {
                    self.invalidate();
                    return Err(ProxyError::NotRetriable {
                        method: name,
                        source,
                    });
                }
                RpcOutcome::PermanentFailure(source) => {
                    self.invalidate();
                    return Err(ProxyError::Rpc {
                        method: name,
                        source,
                    });
                }
                RpcOutcome::TransientFailure(reason) => {
                    self.invalidate();
                    match self.policy.decide(attempt, deadline.remaining(clock.as_ref())) {
                        RetryDecision::RetryAfter(delay) => {
                            warn!(
                                cluster = %self.cluster.name,
                                method = name,
                                attempt,
                                "transient scheduler error: {}, retrying in {:?}",
                                reason,
                                delay
                            );
                            clock.sleep(delay);
                        }
                        RetryDecision::NoRetry => {
                            debug!(method = name, "retry budget spent");
                        }
                    }
                    last_error = reason;
                }
            }
        }
    }

    fn call_once(
        &mut self,
        method: Method,
        args: &[Value],
        limit: &ConnectLimit<'_>,
    ) -> Result<Result<Response, RpcError>, ClientError> {
        let client = self.scheduler_client()?;
        let mut thrift = client.get_thrift_client_within(limit)?;
        Ok(thrift.call(method, args))
    }
}
