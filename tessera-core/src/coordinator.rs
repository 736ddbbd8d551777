//! Typed read entry points. Each call issues one [`GetOperation`] and waits
//! for its terminal outcome.

use crate::blob_id::BlobId;
use crate::error::CoordinatorError;
use crate::operations::{
    BlobData, BlobInfo, BlobProperties, GetOperation, OperationContext, OperationHandle, Payload,
    PayloadKind,
};
use bytes::Bytes;
use std::sync::Arc;

#[derive(Clone)]
pub struct Coordinator {
    context: Arc<OperationContext>,
}

impl Coordinator {
    pub fn new(context: Arc<OperationContext>) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Arc<OperationContext> {
        &self.context
    }

    /// Starts an operation without waiting for it.
    pub fn submit(&self, blob_id: BlobId, kind: PayloadKind) -> OperationHandle {
        tracing::debug!("submitting get {} for {}", kind, blob_id);
        GetOperation::new(self.context.clone(), blob_id, kind).start()
    }

    pub async fn get(
        &self,
        blob_id: BlobId,
        kind: PayloadKind,
    ) -> Result<Payload, CoordinatorError> {
        self.submit(blob_id, kind).result().await
    }

    pub async fn get_blob_properties(
        &self,
        blob_id: BlobId,
    ) -> Result<BlobProperties, CoordinatorError> {
        match self.get(blob_id, PayloadKind::BlobProperties).await? {
            Payload::Properties(properties) => Ok(properties),
            other => Err(mismatch(PayloadKind::BlobProperties, &other)),
        }
    }

    pub async fn get_blob_user_metadata(&self, blob_id: BlobId) -> Result<Bytes, CoordinatorError> {
        match self.get(blob_id, PayloadKind::UserMetadata).await? {
            Payload::UserMetadata(metadata) => Ok(metadata),
            other => Err(mismatch(PayloadKind::UserMetadata, &other)),
        }
    }

    pub async fn get_blob(&self, blob_id: BlobId) -> Result<BlobData, CoordinatorError> {
        match self.get(blob_id, PayloadKind::BlobData).await? {
            Payload::Data(data) => Ok(data),
            other => Err(mismatch(PayloadKind::BlobData, &other)),
        }
    }

    pub async fn get_blob_all(&self, blob_id: BlobId) -> Result<BlobInfo, CoordinatorError> {
        match self.get(blob_id, PayloadKind::All).await? {
            Payload::All(info) => Ok(info),
            other => Err(mismatch(PayloadKind::All, &other)),
        }
    }
}

fn mismatch(expected: PayloadKind, payload: &Payload) -> CoordinatorError {
    CoordinatorError::UnexpectedInternalState(format!(
        "expected {} payload, got {}",
        expected,
        payload.kind()
    ))
}
