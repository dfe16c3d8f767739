use thiserror::Error;

use crate::client::ClientError;
use crate::rpc::{ArgumentError, RpcError};
use crate::transport::TransportError;

/// Why a proxied RPC failed.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Arguments(#[from] ArgumentError),
    /// Could not obtain a connected client.
    #[error("{method}: unable to reach scheduler for cluster {cluster:?}: {source}")]
    Client {
        method: &'static str,
        cluster: String,
        #[source]
        source: ClientError,
    },
    /// Lost the connection on a call that is not safe to repeat.
    #[error("{method}: connection error communicating with scheduler: {source}")]
    NotRetriable {
        method: &'static str,
        #[source]
        source: TransportError,
    },
    #[error("{method}: authentication failed: {message}")]
    Auth { method: &'static str, message: String },
    #[error("timed out attempting to issue {method} to {cluster:?} (last error: {last_error})")]
    Timeout {
        method: &'static str,
        cluster: String,
        last_error: String,
    },
    #[error("{method}: {source}")]
    Rpc {
        method: &'static str,
        #[source]
        source: RpcError,
    },
    #[error("{method} to {cluster:?} abandoned: proxy is terminating")]
    Terminated { method: &'static str, cluster: String },
}

impl ProxyError {
    /// Wire name of the RPC that failed.
    pub fn method(&self) -> &'static str {
        match self {
            ProxyError::Arguments(e) => e.method,
            ProxyError::Client { method, .. }
            | ProxyError::NotRetriable { method, .. }
            | ProxyError::Auth { method, .. }
            | ProxyError::Timeout { method, .. }
            | ProxyError::Rpc { method, .. }
            | ProxyError::Terminated { method, .. } => method,
        }
    }
}
