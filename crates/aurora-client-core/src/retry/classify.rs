//! Classify a stub result into the outcome that drives the retry loop.

use crate::rpc::{Response, RpcError};
use crate::transport::TransportError;

/// What one stub invocation means for the proxied call.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcOutcome {
    Success(Response),
    /// Server overload, timeout, or (for calls marked retriable) a lost connection.
    TransientFailure(String),
    /// Surface the error as-is; never retried.
    PermanentFailure(RpcError),
    /// Credentials rejected.
    AuthFailure(String),
}

/// `retry_transport_errors` marks the call idempotent: a dropped connection may
/// then be retried instead of failing the call.
pub fn classify_outcome(result: Result<Response, RpcError>, retry_transport_errors: bool) -> RpcOutcome {
    match result {
        Ok(resp) if resp.is_transient() => {
            RpcOutcome::TransientFailure(resp.detail_messages().join(", "))
        }
        Ok(resp) => RpcOutcome::Success(resp),
        Err(RpcError::Transport(TransportError::Unauthorized(code))) => {
            RpcOutcome::AuthFailure(format!("HTTP {}", code))
        }
        Err(RpcError::Transport(TransportError::TimedOut(msg))) => {
            RpcOutcome::TransientFailure(format!("timed out: {}", msg))
        }
        Err(RpcError::Transport(e)) if retry_transport_errors && e.is_network() => {
            RpcOutcome::TransientFailure(e.to_string())
        }
        Err(e) => RpcOutcome::PermanentFailure(e),
    }
}
