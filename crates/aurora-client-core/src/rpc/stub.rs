//! Typed stub over a transport.

use serde_json::Value;

use super::{envelope, Method, Response, RpcError};
use crate::transport::Transport;

/// Encodes one call, sends it over the transport and decodes the reply.
pub trait SchedulerStub: Send {
    fn call(
        &mut self,
        transport: &mut dyn Transport,
        method: Method,
        args: &[Value],
    ) -> Result<Response, RpcError>;
}

pub trait StubFactory: Send + Sync {
    fn build(&self) -> Box<dyn SchedulerStub>;
}

/// Thrift JSON protocol stub.
#[derive(Debug, Default)]
pub struct ThriftJsonStub {
    seqid: i32,
}

impl SchedulerStub for ThriftJsonStub {
    fn call(
        &mut self,
        transport: &mut dyn Transport,
        method: Method,
        args: &[Value],
    ) -> Result<Response, RpcError> {
        self.seqid = self.seqid.wrapping_add(1);
        let name = method.name();
        transport.write(&envelope::encode_call(name, self.seqid, args))?;
        transport.flush()?;
        let reply = transport.read_all()?;
        envelope::decode_reply(&reply, name, self.seqid)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThriftJsonStubFactory;

impl StubFactory for ThriftJsonStubFactory {
    fn build(&self) -> Box<dyn SchedulerStub> {
        Box::new(ThriftJsonStub::default())
    }
}

/// A connected stub, borrowed from the client that owns its transport.
pub struct ThriftClient<'a> {
    pub(crate) transport: &'a mut dyn Transport,
    pub(crate) stub: &'a mut dyn SchedulerStub,
}

impl ThriftClient<'_> {
    pub fn call(&mut self, method: Method, args: &[Value]) -> Result<Response, RpcError> {
        self.stub.call(&mut *self.transport, method, args)
    }
}
