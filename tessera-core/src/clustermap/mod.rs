//! Cluster topology: datacenters, data nodes, disks, partitions and their
//! replicas, plus the [`ClusterMap`] interface the operation engine reads.

pub mod data_node;
pub mod datacenter;
pub mod disk;
pub mod layout;
pub mod partition;
pub mod resolver;
pub mod static_map;

use crate::Result;
use crate::blob_id::PartitionId;
use crate::health::ReplicaEvent;
use serde::{Deserialize, Serialize};

pub use data_node::DataNode;
pub use datacenter::Datacenter;
pub use disk::Disk;
pub use layout::{
    DataNodeLayout, DatacenterLayout, DiskLayout, HardwareLayout, PartitionEntry, PartitionLayout,
    ReplicaLayout,
};
pub use partition::{Partition, Replica};
pub use resolver::{
    DnsHostnameResolver, HostnameResolver, NameService, SystemNameService,
    VerbatimHostnameResolver, resolver_for,
};
pub use static_map::StaticClusterMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HardwareState {
    Available,
    Unavailable,
}

/// Read-side view of the cluster used by operations. Implementations must be
/// safe to share across concurrently running operations.
pub trait ClusterMap: Send + Sync {
    /// Replicas of a partition in layout order.
    fn replicas_for(&self, partition: PartitionId) -> Result<Vec<Replica>>;

    fn is_node_down(&self, node: &DataNode) -> bool {
        node.is_down()
    }

    /// Feeds one observed attempt outcome into the node's health policy.
    fn on_replica_event(&self, replica: &Replica, event: ReplicaEvent) {
        let node = replica.data_node();
        match event {
            ReplicaEvent::NodeResponse => node.on_node_response(),
            ReplicaEvent::NodeTimeout => node.on_node_timeout(),
            ReplicaEvent::NodeError => node.on_node_error(),
        }
    }
}
