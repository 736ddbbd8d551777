use crate::blob_id::{BlobId, PartitionId};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TesseraError>;

#[derive(Error, Debug)]
pub enum TesseraError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Partition not found: {0}")]
    PartitionNotFound(PartitionId),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error(transparent)]
    Coordinator(#[from] CoordinatorError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Terminal outcome of a failed operation. This is the only error kind that
/// crosses the operation boundary to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("operation timed out: blob={blob_id} attempted={attempted} elapsed={elapsed:?}")]
    OperationTimeout {
        blob_id: BlobId,
        attempted: usize,
        elapsed: Duration,
    },

    #[error(
        "replicas exhausted: blob={blob_id} attempted={attempted} not_found={not_found}"
    )]
    ReplicasExhausted {
        blob_id: BlobId,
        attempted: usize,
        not_found: usize,
    },

    #[error("blob deleted: {0}")]
    BlobDeleted(BlobId),

    #[error("blob expired: {0}")]
    BlobExpired(BlobId),

    #[error("invalid blob id: {0}")]
    InvalidBlobId(String),

    #[error("unexpected internal state: {0}")]
    UnexpectedInternalState(String),
}

/// Status a storage node reports for a get request it understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerErrorCode {
    NoError,
    BlobNotFound,
    BlobDeleted,
    BlobExpired,
    IoError,
    UnknownError,
}

/// Failure of one attempt against one replica. Always handled inside the
/// operation engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplicaError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("server error: {0:?}")]
    Server(ServerErrorCode),

    #[error("request encoding failed: {0}")]
    Encode(String),
}
