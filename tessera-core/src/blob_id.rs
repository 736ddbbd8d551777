use crate::{Result, TesseraError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Logical shard of the blob namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(pub u64);

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Immutable name of a blob and the partition that owns it.
///
/// The text form is `<partition>.<unique-id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobId {
    partition: PartitionId,
    unique_id: String,
}

impl BlobId {
    pub fn new(partition: PartitionId) -> Self {
        Self {
            partition,
            unique_id: Ulid::new().to_string(),
        }
    }

    pub fn from_parts(partition: PartitionId, unique_id: impl Into<String>) -> Result<Self> {
        let unique_id = unique_id.into();
        validate_unique_id(&unique_id)?;
        Ok(Self {
            partition,
            unique_id,
        })
    }

    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }
}

fn validate_unique_id(unique_id: &str) -> Result<()> {
    if unique_id.is_empty() {
        return Err(TesseraError::Config(
            "blob id unique part cannot be empty".to_string(),
        ));
    }

    if unique_id.contains('.') || unique_id.chars().any(char::is_whitespace) {
        return Err(TesseraError::Config(format!(
            "blob id unique part contains invalid characters: {}",
            unique_id
        )));
    }

    Ok(())
}

impl fmt::Display for BlobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.partition, self.unique_id)
    }
}

impl FromStr for BlobId {
    type Err = TesseraError;

    fn from_str(value: &str) -> Result<Self> {
        let (partition_raw, unique_id) = value.trim().split_once('.').ok_or_else(|| {
            TesseraError::Config(format!(
                "invalid blob id '{}': expected <partition>.<id>",
                value
            ))
        })?;

        let partition = partition_raw.parse::<u64>().map_err(|_| {
            TesseraError::Config(format!(
                "invalid blob id '{}': partition must be an unsigned integer",
                value
            ))
        })?;

        Self::from_parts(PartitionId(partition), unique_id)
    }
}

impl Serialize for BlobId {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BlobId {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
