//! Transport interface used by replica requests. Connection reuse and pooling
//! are left to the implementation.

pub mod http;

use crate::error::ReplicaError;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

pub use http::HttpTransport;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub hostname: String,
    pub port: u16,
    pub secure: bool,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hostname, self.port)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one encoded request and returns the raw response body.
    /// Failures are reported as [`ReplicaError::Transport`].
    async fn send(&self, endpoint: &Endpoint, request: Bytes) -> Result<Bytes, ReplicaError>;
}
