//! Tessera Core - replica-aware read coordination for a partitioned blob store

pub mod blob_id;
pub mod clustermap;
pub mod codec;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod health;
pub mod metrics;
pub mod operations;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use blob_id::{BlobId, PartitionId};
pub use clustermap::*;
pub use codec::{GetRequest, GetResponse, JsonWireCodec, WireCodec};
pub use config::{
    ClusterMapConfig, HostnameResolution, OperationConfig, PortRange, ResourceStateConfig,
};
pub use coordinator::Coordinator;
pub use error::{CoordinatorError, ReplicaError, Result, ServerErrorCode, TesseraError};
pub use health::{
    ConsecutiveFailurePolicy, ConsecutiveFailurePolicyFactory, ReplicaEvent, ResourceStatePolicy,
    ResourceStatePolicyFactory,
};
pub use metrics::{MetricsSink, NoopMetrics, RequestMetrics, RequestStats};
pub use operations::*;
pub use transport::{Endpoint, HttpTransport, Transport};
