use super::datacenter::Datacenter;
use super::layout::{HardwareLayout, PartitionLayout};
use super::partition::{Partition, Replica};
use super::resolver::{HostnameResolver, resolver_for};
use super::{ClusterMap, DataNode};
use crate::blob_id::PartitionId;
use crate::config::ClusterMapConfig;
use crate::health::{ConsecutiveFailurePolicyFactory, ResourceStatePolicyFactory};
use crate::{Result, TesseraError};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// Cluster map built once from a hardware layout and a partition layout.
/// Topology is fixed after construction; only node health changes.
pub struct StaticClusterMap {
    cluster_name: String,
    hardware_version: u64,
    partition_version: u64,
    datacenters: Vec<Datacenter>,
    nodes: HashMap<(String, u16), Arc<DataNode>>,
    partitions: BTreeMap<PartitionId, Partition>,
}

impl StaticClusterMap {
    pub fn new(
        hardware: &HardwareLayout,
        partitions: &PartitionLayout,
        config: &ClusterMapConfig,
        resolver: &dyn HostnameResolver,
        policies: &dyn ResourceStatePolicyFactory,
    ) -> Result<Self> {
        config.validate()?;

        if hardware.cluster_name != partitions.cluster_name {
            return Err(TesseraError::Config(format!(
                "hardware layout cluster '{}' does not match partition layout cluster '{}'",
                hardware.cluster_name, partitions.cluster_name
            )));
        }

        let mut datacenter_names = HashSet::new();
        let mut datacenters = Vec::with_capacity(hardware.datacenters.len());
        let mut nodes = HashMap::new();

        for layout in &hardware.datacenters {
            if !datacenter_names.insert(layout.name.clone()) {
                return Err(TesseraError::Config(format!(
                    "duplicate datacenter: {}",
                    layout.name
                )));
            }

            let datacenter = Datacenter::new(layout, config, resolver, policies)?;
            for node in datacenter.data_nodes() {
                let key = (node.hostname().to_string(), node.port());
                if nodes.insert(key, node.clone()).is_some() {
                    return Err(TesseraError::Config(format!("duplicate data node: {}", node)));
                }
            }
            datacenters.push(datacenter);
        }

        let mut partition_map = BTreeMap::new();
        for entry in &partitions.partitions {
            let id = PartitionId(entry.id);
            let mut replicas = Vec::with_capacity(entry.replicas.len());
            for replica in &entry.replicas {
                let port = u16::try_from(replica.port).map_err(|_| {
                    TesseraError::Config(format!(
                        "partition {} replica has invalid port {}",
                        id, replica.port
                    ))
                })?;
                let node = nodes
                    .get(&(replica.hostname.clone(), port))
                    .ok_or_else(|| {
                        TesseraError::Config(format!(
                            "partition {} references unknown data node {}:{}",
                            id, replica.hostname, replica.port
                        ))
                    })?;
                replicas.push(Replica::new(id, node.clone(), &replica.mount_path)?);
            }

            if partition_map
                .insert(id, Partition::new(id, replicas))
                .is_some()
            {
                return Err(TesseraError::Config(format!("duplicate partition: {}", id)));
            }
        }

        tracing::info!(
            "loaded cluster map {}: datacenters={} nodes={} partitions={}",
            hardware.cluster_name,
            datacenters.len(),
            nodes.len(),
            partition_map.len()
        );

        Ok(Self {
            cluster_name: hardware.cluster_name.clone(),
            hardware_version: hardware.version,
            partition_version: partitions.version,
            datacenters,
            nodes,
            partitions: partition_map,
        })
    }

    /// Builds the map with the resolver selected by configuration and the
    /// consecutive-failure health policy.
    pub fn from_config(
        hardware: &HardwareLayout,
        partitions: &PartitionLayout,
        config: &ClusterMapConfig,
    ) -> Result<Self> {
        let resolver = resolver_for(config.hostname_resolution);
        let policies = ConsecutiveFailurePolicyFactory::new(config.resource_state)?;
        Self::new(hardware, partitions, config, resolver.as_ref(), &policies)
    }

    pub fn from_files(
        hardware_path: impl AsRef<Path>,
        partition_path: impl AsRef<Path>,
        config: &ClusterMapConfig,
    ) -> Result<Self> {
        let hardware = HardwareLayout::from_file(hardware_path)?;
        let partitions = PartitionLayout::from_file(partition_path)?;
        Self::from_config(&hardware, &partitions, config)
    }

    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn datacenters(&self) -> &[Datacenter] {
        &self.datacenters
    }

    pub fn data_node(&self, hostname: &str, port: u16) -> Option<&Arc<DataNode>> {
        self.nodes.get(&(hostname.to_string(), port))
    }

    pub fn data_nodes(&self) -> impl Iterator<Item = &Arc<DataNode>> {
        self.datacenters
            .iter()
            .flat_map(|datacenter| datacenter.data_nodes().iter())
    }

    pub fn partitions(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.values()
    }

    pub fn raw_capacity_in_bytes(&self) -> u64 {
        self.datacenters
            .iter()
            .map(Datacenter::raw_capacity_in_bytes)
            .sum()
    }

    pub fn to_hardware_layout(&self) -> HardwareLayout {
        HardwareLayout {
            cluster_name: self.cluster_name.clone(),
            version: self.hardware_version,
            datacenters: self.datacenters.iter().map(Datacenter::to_layout).collect(),
        }
    }

    pub fn to_partition_layout(&self) -> PartitionLayout {
        use super::layout::{PartitionEntry, ReplicaLayout};

        PartitionLayout {
            cluster_name: self.cluster_name.clone(),
            version: self.partition_version,
            partitions: self
                .partitions
                .values()
                .map(|partition| PartitionEntry {
                    id: partition.id().0,
                    replicas: partition
                        .replicas()
                        .iter()
                        .map(|replica| ReplicaLayout {
                            hostname: replica.data_node().hostname().to_string(),
                            port: replica.data_node().port() as u32,
                            mount_path: replica.mount_path().to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl ClusterMap for StaticClusterMap {
    fn replicas_for(&self, partition: PartitionId) -> Result<Vec<Replica>> {
        self.partitions
            .get(&partition)
            .map(|partition| partition.replicas().to_vec())
            .ok_or(TesseraError::PartitionNotFound(partition))
    }
}
