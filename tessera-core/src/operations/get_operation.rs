//! Operation engine for reads.
//!
//! A [`GetOperation`] resolves the replicas of a blob's partition, orders
//! them, and keeps up to `parallelism` [`OperationRequest`]s in flight until
//! one of them returns a decoded payload, the candidates run out, or the
//! operation deadline passes. Requests report back over a single channel and
//! the engine is the only reader, so all operation state is owned by the
//! driving task.
//!
//! Completion is first-success: blobs are immutable once written, so any one
//! replica answer is authoritative.

use super::context::OperationContext;
use super::kind::{Payload, PayloadKind};
use super::ordering::order_candidates;
use super::request::{OperationRequest, OperationResponse};
use crate::blob_id::BlobId;
use crate::clustermap::Replica;
use crate::error::{CoordinatorError, ReplicaError, ServerErrorCode};
use crate::health::ReplicaEvent;
use crate::TesseraError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
enum OperationState {
    InFlight,
    Succeeded,
    Failed(CoordinatorError),
}

pub struct GetOperation {
    context: Arc<OperationContext>,
    blob_id: BlobId,
    kind: PayloadKind,
    started: Instant,
    deadline: Instant,
    candidates: Vec<Replica>,
    next_candidate: usize,
    in_flight: HashMap<usize, JoinHandle<()>>,
    attempted: usize,
    not_found: usize,
    result: Option<Payload>,
    state: OperationState,
}

impl GetOperation {
    /// The deadline starts counting now.
    pub fn new(context: Arc<OperationContext>, blob_id: BlobId, kind: PayloadKind) -> Self {
        let started = Instant::now();
        let deadline = started + context.config().operation_timeout();
        Self {
            context,
            blob_id,
            kind,
            started,
            deadline,
            candidates: Vec::new(),
            next_candidate: 0,
            in_flight: HashMap::new(),
            attempted: 0,
            not_found: 0,
            result: None,
            state: OperationState::InFlight,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn blob_id(&self) -> &BlobId {
        &self.blob_id
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Drives the operation on a spawned task and hands back a handle the
    /// caller can wait on.
    pub fn start(self) -> OperationHandle {
        let (sender, receiver) = watch::channel(None);
        tokio::spawn(async move {
            let completed = self.execute().await;
            let _ = sender.send(Some(completed.payload()));
        });
        OperationHandle { receiver }
    }

    pub async fn execute(mut self) -> CompletedOperation {
        self.drive().await;

        for (_, request) in self.in_flight.drain() {
            request.abort();
        }

        CompletedOperation {
            blob_id: self.blob_id,
            kind: self.kind,
            attempted: self.attempted,
            state: self.state,
            result: self.result,
        }
    }

    async fn drive(&mut self) {
        let partition = self.blob_id.partition();
        let replicas = match self.context.cluster_map().replicas_for(partition) {
            Ok(replicas) => replicas,
            Err(TesseraError::PartitionNotFound(_)) => {
                self.fail(CoordinatorError::InvalidBlobId(format!(
                    "{}: unknown partition {}",
                    self.blob_id, partition
                )));
                return;
            }
            Err(error) => {
                self.fail(CoordinatorError::UnexpectedInternalState(format!(
                    "replica lookup failed for {}: {}",
                    self.blob_id, error
                )));
                return;
            }
        };

        self.candidates = order_candidates(
            replicas,
            self.context.config(),
            self.context.cluster_map().as_ref(),
        );

        let (sender, mut responses) = mpsc::unbounded_channel();

        loop {
            if Instant::now() >= self.deadline {
                self.fail_timeout();
                return;
            }

            self.issue_requests(&sender);

            if self.in_flight.is_empty() {
                self.fail(CoordinatorError::ReplicasExhausted {
                    blob_id: self.blob_id.clone(),
                    attempted: self.attempted,
                    not_found: self.not_found,
                });
                return;
            }

            tokio::select! {
                biased;
                Some(response) = responses.recv() => {
                    self.handle_response(response);
                    if self.state != OperationState::InFlight {
                        return;
                    }
                }
                _ = tokio::time::sleep_until(self.deadline) => {
                    self.fail_timeout();
                    return;
                }
            }
        }
    }

    fn issue_requests(&mut self, sender: &mpsc::UnboundedSender<OperationResponse>) {
        let parallelism = self.context.config().parallelism.max(1);

        while self.in_flight.len() < parallelism && self.next_candidate < self.candidates.len() {
            let candidate = self.next_candidate;
            self.next_candidate += 1;

            let now = Instant::now();
            let remaining = self.deadline.saturating_duration_since(now);
            let request_timeout = self.context.config().request_timeout();
            let timeout = request_timeout.min(remaining);

            let request = OperationRequest::new(
                self.context.clone(),
                candidate,
                self.candidates[candidate].clone(),
                self.blob_id.clone(),
                self.kind,
                timeout,
            )
            .deadline_clipped(remaining < request_timeout);
            let sender = sender.clone();
            let handle = tokio::spawn(request.run(sender));

            self.in_flight.insert(candidate, handle);
            self.attempted += 1;
        }
    }

    fn handle_response(&mut self, response: OperationResponse) {
        if self.in_flight.remove(&response.candidate).is_none() {
            return;
        }

        let OperationResponse {
            replica,
            result,
            elapsed,
            deadline_clipped,
            ..
        } = response;
        let cluster_map = self.context.cluster_map();

        match result {
            Ok(payload) => {
                cluster_map.on_replica_event(&replica, ReplicaEvent::NodeResponse);
                tracing::trace!(
                    "get {} for {} served by {} in {:?}",
                    self.kind,
                    self.blob_id,
                    replica,
                    elapsed
                );
                self.set_result(payload);
                self.state = OperationState::Succeeded;
            }
            Err(error) => {
                // A timeout cut short by the operation deadline is not the node's fault.
                let clipped_timeout = deadline_clipped && matches!(error, ReplicaError::Timeout(_));
                if let Some(event) = replica_event_for(&error).filter(|_| !clipped_timeout) {
                    cluster_map.on_replica_event(&replica, event);
                }
                tracing::debug!(
                    "replica request failed: blob={} replica={} error={}",
                    self.blob_id,
                    replica,
                    error
                );

                match error {
                    ReplicaError::Server(ServerErrorCode::BlobDeleted) => {
                        self.fail(CoordinatorError::BlobDeleted(self.blob_id.clone()));
                    }
                    ReplicaError::Server(ServerErrorCode::BlobExpired) => {
                        self.fail(CoordinatorError::BlobExpired(self.blob_id.clone()));
                    }
                    ReplicaError::Server(ServerErrorCode::BlobNotFound) => {
                        self.not_found += 1;
                    }
                    _ => {}
                }
            }
        }
    }

    fn set_result(&mut self, payload: Payload) {
        if self.result.is_none() {
            self.result = Some(payload);
        }
    }

    fn fail_timeout(&mut self) {
        self.fail(CoordinatorError::OperationTimeout {
            blob_id: self.blob_id.clone(),
            attempted: self.attempted,
            elapsed: self.started.elapsed(),
        });
    }

    fn fail(&mut self, error: CoordinatorError) {
        if self.state != OperationState::InFlight {
            return;
        }
        tracing::warn!("get {} failed: {}", self.kind, error);
        self.state = OperationState::Failed(error);
    }
}

fn replica_event_for(error: &ReplicaError) -> Option<ReplicaEvent> {
    match error {
        ReplicaError::Timeout(_) => Some(ReplicaEvent::NodeTimeout),
        ReplicaError::Transport(_) | ReplicaError::MalformedResponse(_) => {
            Some(ReplicaEvent::NodeError)
        }
        ReplicaError::Server(_) => Some(ReplicaEvent::NodeResponse),
        ReplicaError::Encode(_) => None,
    }
}

/// Final state of an operation after its driver returned.
#[derive(Debug)]
pub struct CompletedOperation {
    blob_id: BlobId,
    kind: PayloadKind,
    attempted: usize,
    state: OperationState,
    result: Option<Payload>,
}

impl CompletedOperation {
    pub fn blob_id(&self) -> &BlobId {
        &self.blob_id
    }

    pub fn kind(&self) -> PayloadKind {
        self.kind
    }

    pub fn attempted(&self) -> usize {
        self.attempted
    }

    /// Returns the recorded payload or the terminal error. Never yields an
    /// empty payload: a success without a recorded result is reported as
    /// [`CoordinatorError::UnexpectedInternalState`].
    pub fn payload(&self) -> Result<Payload, CoordinatorError> {
        match &self.state {
            OperationState::Succeeded => self.result.clone().ok_or_else(|| {
                let error = CoordinatorError::UnexpectedInternalState(format!(
                    "get {} for {} has no recorded payload",
                    self.kind, self.blob_id
                ));
                tracing::error!("payload is missing and should not be: {}", error);
                error
            }),
            OperationState::Failed(error) => Err(error.clone()),
            OperationState::InFlight => {
                let error = CoordinatorError::UnexpectedInternalState(format!(
                    "get {} for {} queried before reaching a terminal state",
                    self.kind, self.blob_id
                ));
                tracing::error!("{}", error);
                Err(error)
            }
        }
    }
}

/// Waits for the outcome of an operation started with [`GetOperation::start`].
#[derive(Debug, Clone)]
pub struct OperationHandle {
    receiver: watch::Receiver<Option<Result<Payload, CoordinatorError>>>,
}

impl OperationHandle {
    /// Blocks until the operation is terminal. Every call after that returns
    /// the same outcome.
    pub async fn result(&self) -> Result<Payload, CoordinatorError> {
        let mut receiver = self.receiver.clone();
        let outcome = receiver
            .wait_for(Option::is_some)
            .await
            .map(|outcome| outcome.clone());

        match outcome {
            Ok(Some(result)) => result,
            Ok(None) | Err(_) => Err(CoordinatorError::UnexpectedInternalState(
                "operation driver stopped without an outcome".to_string(),
            )),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.receiver.borrow().is_some()
    }
}
