//! Wire codec for get requests and responses.

use crate::blob_id::BlobId;
use crate::error::{ReplicaError, ServerErrorCode};
use crate::operations::kind::{BlobProperties, Payload, PayloadKind};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequest {
    pub correlation_id: u64,
    pub client_id: String,
    pub blob_id: BlobId,
    pub kind: PayloadKind,
}

/// Response envelope. Only the fields relevant to the requested kind are
/// looked at; binary fields are base64.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResponse {
    pub correlation_id: u64,
    pub status: Option<ServerErrorCode>,
    pub properties: Option<BlobProperties>,
    pub user_metadata: Option<String>,
    pub data: Option<String>,
}

pub trait WireCodec: Send + Sync {
    fn encode_request(&self, request: &GetRequest) -> Result<Bytes, ReplicaError>;

    fn decode_response(
        &self,
        kind: PayloadKind,
        correlation_id: u64,
        body: &[u8],
    ) -> Result<Payload, ReplicaError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonWireCodec;

impl WireCodec for JsonWireCodec {
    fn encode_request(&self, request: &GetRequest) -> Result<Bytes, ReplicaError> {
        serde_json::to_vec(request)
            .map(Bytes::from)
            .map_err(|error| ReplicaError::Encode(error.to_string()))
    }

    fn decode_response(
        &self,
        kind: PayloadKind,
        correlation_id: u64,
        body: &[u8],
    ) -> Result<Payload, ReplicaError> {
        let response: GetResponse = serde_json::from_slice(body)
            .map_err(|error| ReplicaError::MalformedResponse(error.to_string()))?;

        if response.correlation_id != correlation_id {
            return Err(ReplicaError::MalformedResponse(format!(
                "correlation id mismatch: expected={} actual={}",
                correlation_id, response.correlation_id
            )));
        }

        match response.status {
            Some(ServerErrorCode::NoError) => kind.decode(response),
            Some(code) => Err(ReplicaError::Server(code)),
            None => Err(ReplicaError::MalformedResponse(
                "response is missing status".to_string(),
            )),
        }
    }
}
