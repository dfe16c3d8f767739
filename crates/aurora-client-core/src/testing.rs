//! Test doubles shared by the unit tests: a manual clock, scripted transports
//! and stubs, and a fixed-credential auth provider.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::auth::{AuthProvider, BasicCredentials, Credentials};
use crate::retry::Clock;
use crate::rpc::{decode_call, Method, Response, RpcError, SchedulerStub, StubFactory};
use crate::transport::{Transport, TransportConfig, TransportError, TransportFactory};

/// Clock that only moves when slept on.
pub struct FakeClock {
    start: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        *self.elapsed.lock().unwrap() += duration;
        self.sleeps.lock().unwrap().push(duration);
    }
}

type Responder = Box<dyn FnMut(&str, i32) -> Vec<u8> + Send>;

/// In-memory transport answering each flushed call through a closure.
pub struct LoopbackTransport {
    responder: Responder,
    open: bool,
    pending: Vec<u8>,
    reply: Vec<u8>,
    pos: usize,
    requests: Vec<Vec<u8>>,
}

impl LoopbackTransport {
    pub fn replying(responder: impl FnMut(&str, i32) -> Vec<u8> + Send + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            open: false,
            pending: Vec::new(),
            reply: Vec::new(),
            pos: 0,
            requests: Vec::new(),
        }
    }

    pub fn requests(&self) -> &[Vec<u8>] {
        &self.requests
    }
}

impl Transport for LoopbackTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        self.open = true;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let n = (self.reply.len() - self.pos).min(buf.len());
        buf[..n].copy_from_slice(&self.reply[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::NotOpen("loopback closed".to_string()));
        }
        self.pending.extend_from_slice(buf);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        let request = std::mem::take(&mut self.pending);
        let (name, seqid, _) =
            decode_call(&request).map_err(|e| TransportError::Unknown(e.to_string()))?;
        self.reply = (self.responder)(&name, seqid);
        self.pos = 0;
        self.requests.push(request);
        Ok(())
    }
}

#[derive(Default)]
struct FactoryState {
    open_script: VecDeque<Result<(), TransportError>>,
    created: Vec<(String, TransportConfig)>,
    opens: usize,
    closes: usize,
}

/// Transport factory recording every transport it builds; `open` results
/// follow a script, then succeed.
#[derive(Clone, Default)]
pub struct FakeTransportFactory {
    state: Arc<Mutex<FactoryState>>,
}

impl FakeTransportFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_open_results(results: Vec<Result<(), TransportError>>) -> Self {
        let factory = Self::default();
        factory.state.lock().unwrap().open_script = results.into();
        factory
    }

    pub fn created(&self) -> Vec<(String, TransportConfig)> {
        self.state.lock().unwrap().created.clone()
    }

    pub fn created_uris(&self) -> Vec<String> {
        self.created().into_iter().map(|(uri, _)| uri).collect()
    }

    pub fn opens(&self) -> usize {
        self.state.lock().unwrap().opens
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }
}

impl TransportFactory for FakeTransportFactory {
    fn create(&self, uri: &str, config: TransportConfig) -> Box<dyn Transport> {
        self.state
            .lock()
            .unwrap()
            .created
            .push((uri.to_string(), config));
        Box::new(FakeTransport {
            state: Arc::clone(&self.state),
            open: false,
        })
    }
}

struct FakeTransport {
    state: Arc<Mutex<FactoryState>>,
    open: bool,
}

impl Transport for FakeTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.opens += 1;
        let result = state.open_script.pop_front().unwrap_or(Ok(()));
        self.open = result.is_ok();
        result
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        if self.open {
            self.state.lock().unwrap().closes += 1;
        }
        self.open = false;
    }

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, TransportError> {
        Ok(0)
    }

    fn write(&mut self, _buf: &[u8]) -> Result<(), TransportError> {
        Ok(())
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[derive(Default)]
struct StubState {
    script: VecDeque<Result<Response, RpcError>>,
    calls: Vec<(Method, Vec<Value>)>,
    built: usize,
}

/// Stub factory whose stubs answer from one shared script (then `OK`) and
/// record every invocation.
#[derive(Clone, Default)]
pub struct ScriptedStubs {
    state: Arc<Mutex<StubState>>,
}

impl ScriptedStubs {
    pub fn new(script: Vec<Result<Response, RpcError>>) -> Self {
        let stubs = Self::default();
        stubs.state.lock().unwrap().script = script.into();
        stubs
    }

    pub fn calls(&self) -> Vec<(Method, Vec<Value>)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn built(&self) -> usize {
        self.state.lock().unwrap().built
    }
}

impl StubFactory for ScriptedStubs {
    fn build(&self) -> Box<dyn SchedulerStub> {
        self.state.lock().unwrap().built += 1;
        Box::new(self.clone())
    }
}

impl SchedulerStub for ScriptedStubs {
    fn call(
        &mut self,
        _transport: &mut dyn Transport,
        method: Method,
        args: &[Value],
    ) -> Result<Response, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((method, args.to_vec()));
        state.script.pop_front().unwrap_or_else(|| Ok(Response::ok()))
    }
}

/// Auth provider with fixed credentials and diagnostic.
pub struct FixedAuth;

impl FixedAuth {
    pub fn credentials() -> BasicCredentials {
        BasicCredentials {
            username: "operator".to_string(),
            password: "secret".to_string(),
        }
    }
}

impl AuthProvider for FixedAuth {
    fn mechanism(&self) -> &str {
        "FIXED"
    }

    fn auth(&self) -> Option<Credentials> {
        Some(Credentials::Basic(Self::credentials()))
    }

    fn failed_auth_message(&self) -> String {
        "failed auth".to_string()
    }
}
