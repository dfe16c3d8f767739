//! HTTP transport carrying framed RPC messages to the scheduler.
//!
//! The RPC stub writes a whole request into the transport, `flush`es it (one
//! HTTP POST), then reads the reply back. Transports are built through a
//! [`TransportFactory`] so the client can be exercised without a network.

mod classify;
mod http;
mod session;

pub use classify::classify_curl_error;
pub use http::{CurlTransportFactory, HttpTransport};
pub use session::{
    bypass_leader_redirect_session_factory, HttpSession, SessionFactory,
    BYPASS_LEADER_REDIRECT_HEADER_NAME,
};

use thiserror::Error;

use crate::auth::Credentials;

/// Raw transport failure; the proxy decides what it means for the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not reach the endpoint (refused, DNS, TLS handshake, reset).
    #[error("transport not open: {0}")]
    NotOpen(String),
    #[error("timed out: {0}")]
    TimedOut(String),
    /// The scheduler rejected the credentials (HTTP 401).
    #[error("unauthorized (HTTP {0})")]
    Unauthorized(u32),
    #[error("invalid scheduler URI {0:?}")]
    InvalidUri(String),
    #[error("transport error: {0}")]
    Unknown(String),
}

impl TransportError {
    /// True for failures worth retrying against the same endpoint.
    pub fn is_network(&self) -> bool {
        !matches!(self, TransportError::InvalidUri(_))
    }
}

/// Everything a transport needs besides the URI.
#[derive(Clone)]
pub struct TransportConfig {
    pub auth: Option<Credentials>,
    pub user_agent: String,
    pub session_factory: SessionFactory,
}

impl std::fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportConfig")
            .field("auth", &self.auth.is_some())
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

/// Framed, blocking transport to one scheduler endpoint.
pub trait Transport: Send {
    fn open(&mut self) -> Result<(), TransportError>;

    fn is_open(&self) -> bool;

    fn close(&mut self);

    /// Read from the current reply; returns 0 once the reply is consumed.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Append to the pending request.
    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError>;

    /// Send the pending request and make its reply readable.
    fn flush(&mut self) -> Result<(), TransportError>;

    /// Drain the current reply.
    fn read_all(&mut self) -> Result<Vec<u8>, TransportError> {
        let mut out = Vec::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = self.read(&mut buf)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&buf[..n]);
        }
    }
}

pub trait TransportFactory: Send + Sync {
    fn create(&self, uri: &str, config: TransportConfig) -> Box<dyn Transport>;
}
