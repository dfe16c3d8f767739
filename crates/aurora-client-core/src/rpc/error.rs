use thiserror::Error;

use crate::transport::TransportError;

/// Failure of one stub invocation, before any retry classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The reply could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The scheduler answered with an exception instead of a response.
    #[error("application exception (type {kind}): {message}")]
    Application { kind: i32, message: String },
}
