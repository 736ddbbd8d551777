use super::context::OperationContext;
use super::kind::{Payload, PayloadKind};
use crate::blob_id::BlobId;
use crate::clustermap::Replica;
use crate::codec::GetRequest;
use crate::error::ReplicaError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;

/// Terminal outcome of one replica request, delivered to the engine.
#[derive(Debug)]
pub struct OperationResponse {
    pub candidate: usize,
    pub replica: Replica,
    pub result: Result<Payload, ReplicaError>,
    pub elapsed: Duration,
    /// The request timeout was cut short to fit the operation deadline, so a
    /// [`ReplicaError::Timeout`] says nothing about the node.
    pub deadline_clipped: bool,
}

/// A single attempt against a single replica. It sends, waits, decodes and
/// reports exactly one [`OperationResponse`]; it never retries.
pub struct OperationRequest {
    context: Arc<OperationContext>,
    candidate: usize,
    replica: Replica,
    blob_id: BlobId,
    kind: PayloadKind,
    timeout: Duration,
    deadline_clipped: bool,
}

impl OperationRequest {
    pub fn new(
        context: Arc<OperationContext>,
        candidate: usize,
        replica: Replica,
        blob_id: BlobId,
        kind: PayloadKind,
        timeout: Duration,
    ) -> Self {
        tracing::trace!("created {} request for {}", kind, replica);
        Self {
            context,
            candidate,
            replica,
            blob_id,
            kind,
            timeout,
            deadline_clipped: false,
        }
    }

    /// Marks the timeout as shortened by the operation deadline rather than
    /// the configured request timeout.
    pub fn deadline_clipped(mut self, clipped: bool) -> Self {
        self.deadline_clipped = clipped;
        self
    }

    pub async fn run(self, responses: UnboundedSender<OperationResponse>) {
        let started = Instant::now();
        let node = self.replica.data_node().clone();
        self.context.metrics().record_rate(&node, self.kind);

        let result = match tokio::time::timeout(self.timeout, self.send()).await {
            Ok(result) => result,
            Err(_) => Err(ReplicaError::Timeout(self.timeout)),
        };

        let elapsed = started.elapsed();
        self.context
            .metrics()
            .record_latency(&node, self.kind, elapsed);

        // The engine drops its receiver once the operation is terminal.
        let _ = responses.send(OperationResponse {
            candidate: self.candidate,
            replica: self.replica,
            result,
            elapsed,
            deadline_clipped: self.deadline_clipped,
        });
    }

    async fn send(&self) -> Result<Payload, ReplicaError> {
        let correlation_id = self.context.next_correlation_id();
        let request = GetRequest {
            correlation_id,
            client_id: self.context.client_id().to_string(),
            blob_id: self.blob_id.clone(),
            kind: self.kind,
        };
        let bytes = self.context.codec().encode_request(&request)?;

        let node = self.replica.data_node();
        let secure = self.context.config().is_ssl_enabled(node.datacenter());
        let endpoint = node.endpoint(secure);

        let body = self.context.transport().send(&endpoint, bytes).await?;
        self.context
            .codec()
            .decode_response(self.kind, correlation_id, &body)
    }
}
