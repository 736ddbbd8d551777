use crate::clustermap::ClusterMap;
use crate::codec::WireCodec;
use crate::config::OperationConfig;
use crate::metrics::MetricsSink;
use crate::transport::Transport;
use crate::Result;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared by every operation a coordinator issues: configuration, the
/// cluster map and the external collaborators replica requests go through.
pub struct OperationContext {
    config: OperationConfig,
    client_id: String,
    cluster_map: Arc<dyn ClusterMap>,
    transport: Arc<dyn Transport>,
    codec: Arc<dyn WireCodec>,
    metrics: Arc<dyn MetricsSink>,
    correlation_ids: AtomicU64,
}

impl OperationContext {
    pub fn new(
        config: OperationConfig,
        client_id: impl Into<String>,
        cluster_map: Arc<dyn ClusterMap>,
        transport: Arc<dyn Transport>,
        codec: Arc<dyn WireCodec>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            client_id: client_id.into(),
            cluster_map,
            transport,
            codec,
            metrics,
            correlation_ids: AtomicU64::new(1),
        })
    }

    pub fn config(&self) -> &OperationConfig {
        &self.config
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn cluster_map(&self) -> &Arc<dyn ClusterMap> {
        &self.cluster_map
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn codec(&self) -> &Arc<dyn WireCodec> {
        &self.codec
    }

    pub fn metrics(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics
    }

    pub fn next_correlation_id(&self) -> u64 {
        self.correlation_ids.fetch_add(1, Ordering::Relaxed)
    }
}
