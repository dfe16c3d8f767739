//! Blocking HTTP transport on libcurl.
//!
//! `open` builds the session headers and performs a connect-only handshake so an
//! unreachable scheduler is detected before any request is written. Each
//! `flush` is one POST of the buffered request; the reply body becomes the
//! read buffer.

use std::time::Duration;

use super::{HttpSession, Transport, TransportConfig, TransportError, TransportFactory};

const THRIFT_CONTENT_TYPE: &str = "application/x-thrift";

pub struct HttpTransport {
    uri: String,
    config: TransportConfig,
    connect_timeout: Duration,
    request_timeout: Duration,
    easy: Option<curl::easy::Easy>,
    wbuf: Vec<u8>,
    rbuf: Vec<u8>,
    rpos: usize,
}

impl HttpTransport {
    pub fn new(uri: impl Into<String>, config: TransportConfig) -> Self {
        Self {
            uri: uri.into(),
            config,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            easy: None,
            wbuf: Vec::new(),
            rbuf: Vec::new(),
            rpos: 0,
        }
    }

    pub fn with_timeouts(mut self, connect: Duration, request: Duration) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    fn session(&self) -> HttpSession {
        let mut session = (self.config.session_factory)();
        session.set_header("User-Agent", self.config.user_agent.clone());
        session.set_header("Content-Type", THRIFT_CONTENT_TYPE);
        session.set_header("Accept", THRIFT_CONTENT_TYPE);
        session
    }

    fn handshake(&self) -> Result<(), TransportError> {
        let mut probe = curl::easy::Easy::new();
        probe.url(&self.uri)?;
        probe.connect_only(true)?;
        probe.connect_timeout(self.connect_timeout)?;
        probe.perform()?;
        Ok(())
    }

    fn build_handle(&self, host: &str) -> Result<curl::easy::Easy, TransportError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(&self.uri)?;
        easy.post(true)?;
        // Non-leaders answer with a redirect to the leader; keep the POST.
        easy.follow_location(true)?;
        easy.max_redirections(10)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.request_timeout)?;

        let mut list = curl::easy::List::new();
        for (name, value) in self.session().headers() {
            list.append(&format!("{}: {}", name.trim(), value.trim()))?;
        }
        // No 100-continue round trip for request bodies.
        list.append("Expect:")?;
        easy.http_headers(list)?;

        if let Some(basic) = self
            .config
            .auth
            .as_ref()
            .and_then(|creds| creds.basic_for_host(host))
        {
            let mut auth = curl::easy::Auth::new();
            auth.basic(true);
            easy.http_auth(&auth)?;
            easy.username(&basic.username)?;
            easy.password(&basic.password)?;
        }
        Ok(easy)
    }
}

impl Transport for HttpTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        let parsed =
            url::Url::parse(&self.uri).map_err(|_| TransportError::InvalidUri(self.uri.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TransportError::InvalidUri(self.uri.clone()));
        }
        let host = parsed
            .host_str()
            .ok_or_else(|| TransportError::InvalidUri(self.uri.clone()))?
            .to_string();

        self.handshake()?;
        self.easy = Some(self.build_handle(&host)?);
        self.wbuf.clear();
        self.rbuf.clear();
        self.rpos = 0;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.easy.is_some()
    }

    fn close(&mut self) {
        self.easy = None;
        self.wbuf.clear();
        self.rbuf.clear();
        self.rpos = 0;
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let remaining = &self.rbuf[self.rpos..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.rpos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        if self.easy.is_none() {
            return Err(TransportError::NotOpen(format!("{} is not open", self.uri)));
        }
        self.wbuf.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        let easy = self
            .easy
            .as_mut()
            .ok_or_else(|| TransportError::NotOpen(format!("{} is not open", self.uri)))?;
        let body = std::mem::take(&mut self.wbuf);
        easy.post_field_size(body.len() as u64)?;
        easy.post_fields_copy(&body)?;

        let mut response = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                response.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let code = easy.response_code()?;
        match code {
            200..=299 => {}
            401 => return Err(TransportError::Unauthorized(code)),
            _ => {
                return Err(TransportError::Unknown(format!(
                    "POST {} returned HTTP {}",
                    self.uri, code
                )))
            }
        }
        tracing::trace!(bytes = response.len(), "scheduler reply received");
        self.rbuf = response;
        self.rpos = 0;
        Ok(())
    }
}

/// Builds [`HttpTransport`]s with fixed timeouts.
#[derive(Debug, Clone, Copy)]
pub struct CurlTransportFactory {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for CurlTransportFactory {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl TransportFactory for CurlTransportFactory {
    fn create(&self, uri: &str, config: TransportConfig) -> Box<dyn Transport> {
        Box::new(
            HttpTransport::new(uri, config)
                .with_timeouts(self.connect_timeout, self.request_timeout),
        )
    }
}
