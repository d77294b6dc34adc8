//! # search-relay
//!
//! Relays search requests through a rotating pool of forward proxies.
//!
//! The pool keeps every proxy's liveness and latency, probes all of them on a
//! fixed period, hands out alive proxies in round-robin order, and takes a
//! proxy out of rotation as soon as a relayed request through it fails.

pub mod config;
pub mod error;
pub mod fetch;
pub mod pool;
pub mod proxy;
pub mod registry;
pub mod server;
mod utils;

pub use config::{PoolConfig, PoolConfigBuilder, ServerConfig};
pub use error::RelayError;
pub use fetch::{ProxyFetcher, ReqwestFetcher};
pub use pool::{ProxyPool, SweepSummary};
pub use proxy::ProxyRecord;
pub use registry::Registry;
