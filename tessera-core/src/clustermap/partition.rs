use super::data_node::DataNode;
use super::disk::Disk;
use crate::blob_id::PartitionId;
use crate::{Result, TesseraError};
use std::fmt;
use std::sync::Arc;

/// One copy location of a partition. The replica names its node and disk; the
/// cluster map owns the topology it points into.
#[derive(Debug, Clone)]
pub struct Replica {
    partition: PartitionId,
    data_node: Arc<DataNode>,
    disk_index: usize,
}

impl Replica {
    pub fn new(
        partition: PartitionId,
        data_node: Arc<DataNode>,
        mount_path: &str,
    ) -> Result<Self> {
        let disk_index = data_node
            .disks()
            .iter()
            .position(|disk| disk.mount_path() == mount_path)
            .ok_or_else(|| {
                TesseraError::Config(format!(
                    "replica of partition {} names mount path {} which {} does not own",
                    partition, mount_path, data_node
                ))
            })?;

        Ok(Self {
            partition,
            data_node,
            disk_index,
        })
    }

    pub fn partition(&self) -> PartitionId {
        self.partition
    }

    pub fn data_node(&self) -> &Arc<DataNode> {
        &self.data_node
    }

    pub fn disk(&self) -> &Disk {
        &self.data_node.disks()[self.disk_index]
    }

    pub fn mount_path(&self) -> &str {
        self.disk().mount_path()
    }
}

impl PartialEq for Replica {
    fn eq(&self, other: &Self) -> bool {
        self.partition == other.partition
            && self.data_node == other.data_node
            && self.disk_index == other.disk_index
    }
}

impl Eq for Replica {}

impl fmt::Display for Replica {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Replica[{}:{}:{}:{}]",
            self.partition,
            self.data_node.hostname(),
            self.data_node.port(),
            self.mount_path()
        )
    }
}

#[derive(Debug, Clone)]
pub struct Partition {
    id: PartitionId,
    replicas: Vec<Replica>,
}

impl Partition {
    pub fn new(id: PartitionId, replicas: Vec<Replica>) -> Self {
        Self { id, replicas }
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    pub fn replicas(&self) -> &[Replica] {
        &self.replicas
    }
}
