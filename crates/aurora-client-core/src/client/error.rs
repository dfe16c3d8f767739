use std::time::Duration;
use thiserror::Error;

use crate::auth::AuthError;
use crate::cluster::MissingTarget;
use crate::discovery::DiscoveryError;

/// Failure to obtain a connected stub. Raised raw; the proxy classifies it.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Bad or incomplete cluster identity; never retried.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The registry advertised no live scheduler in time.
    #[error("no schedulers detected for cluster {cluster:?} within {timeout:?}")]
    DiscoveryTimeout { cluster: String, timeout: Duration },
    #[error("scheduler discovery failed for cluster {cluster:?}: {source}")]
    Discovery {
        cluster: String,
        #[source]
        source: DiscoveryError,
    },
    #[error("could not connect to {uri}: {reason}")]
    CouldNotConnect { uri: String, reason: String },
    /// The scheduler stayed unreachable for the whole connect window; the
    /// leader may have moved.
    #[error("gave up connecting to {uri} after {attempts} attempts: {reason}")]
    ConnectTimeout {
        uri: String,
        attempts: u32,
        reason: String,
    },
    /// The caller asked for connecting to stop.
    #[error("connecting to {uri} was interrupted")]
    Interrupted { uri: String },
}

impl From<MissingTarget> for ClientError {
    fn from(e: MissingTarget) -> Self {
        ClientError::Configuration(e.to_string())
    }
}

impl From<AuthError> for ClientError {
    fn from(e: AuthError) -> Self {
        ClientError::Configuration(e.to_string())
    }
}
