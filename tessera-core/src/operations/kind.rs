//! Payload kinds a get operation can ask for. Each kind decides which part of
//! a replica response it needs and how to turn it into a typed [`Payload`].

use crate::codec::GetResponse;
use crate::error::ReplicaError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    BlobProperties,
    UserMetadata,
    BlobData,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobProperties {
    pub blob_size: u64,
    pub service_id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    pub is_private: bool,
    /// `None` means the blob never expires.
    #[serde(default)]
    pub time_to_live_seconds: Option<u64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub creation_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobData {
    pub size: u64,
    pub content: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub properties: BlobProperties,
    pub user_metadata: Bytes,
    pub data: BlobData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Properties(BlobProperties),
    UserMetadata(Bytes),
    Data(BlobData),
    All(BlobInfo),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Properties(_) => PayloadKind::BlobProperties,
            Payload::UserMetadata(_) => PayloadKind::UserMetadata,
            Payload::Data(_) => PayloadKind::BlobData,
            Payload::All(_) => PayloadKind::All,
        }
    }
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::BlobProperties => "blob_properties",
            PayloadKind::UserMetadata => "user_metadata",
            PayloadKind::BlobData => "blob_data",
            PayloadKind::All => "all",
        }
    }

    /// Extracts this kind's body from a successful response.
    pub fn decode(self, response: GetResponse) -> Result<Payload, ReplicaError> {
        match self {
            PayloadKind::BlobProperties => {
                Ok(Payload::Properties(require_properties(response.properties)?))
            }
            PayloadKind::UserMetadata => Ok(Payload::UserMetadata(decode_base64(
                "user_metadata",
                response.user_metadata,
            )?)),
            PayloadKind::BlobData => Ok(Payload::Data(decode_data(
                response.data,
                response.properties.as_ref(),
            )?)),
            PayloadKind::All => {
                let properties = require_properties(response.properties)?;
                let user_metadata = decode_base64("user_metadata", response.user_metadata)?;
                let data = decode_data(response.data, Some(&properties))?;
                Ok(Payload::All(BlobInfo {
                    properties,
                    user_metadata,
                    data,
                }))
            }
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn require_properties(properties: Option<BlobProperties>) -> Result<BlobProperties, ReplicaError> {
    properties.ok_or_else(|| {
        ReplicaError::MalformedResponse("response is missing blob properties".to_string())
    })
}

fn decode_base64(field: &str, value: Option<String>) -> Result<Bytes, ReplicaError> {
    let value = value.ok_or_else(|| {
        ReplicaError::MalformedResponse(format!("response is missing {}", field))
    })?;
    STANDARD
        .decode(value.as_bytes())
        .map(Bytes::from)
        .map_err(|error| ReplicaError::MalformedResponse(format!("invalid {}: {}", field, error)))
}

fn decode_data(
    data: Option<String>,
    properties: Option<&BlobProperties>,
) -> Result<BlobData, ReplicaError> {
    let content = decode_base64("data", data)?;
    let size = content.len() as u64;

    if let Some(properties) = properties {
        if properties.blob_size != size {
            return Err(ReplicaError::MalformedResponse(format!(
                "blob data length {} does not match blob size {}",
                size, properties.blob_size
            )));
        }
    }

    Ok(BlobData { size, content })
}
