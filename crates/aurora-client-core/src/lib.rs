pub mod config;
pub mod logging;

pub mod auth;
pub mod client;
pub mod cluster;
pub mod discovery;
pub mod proxy;
pub mod retry;
pub mod rpc;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientDeps, ClientError, ClientOptions, SchedulerClient};
pub use cluster::Cluster;
pub use proxy::{CallOptions, ProxyError, SchedulerProxy};
pub use rpc::{Method, Response, ResponseCode};
